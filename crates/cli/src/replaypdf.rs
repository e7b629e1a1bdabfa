//! replaypdf - Run page content streams and print every drawing call
//!
//! Each call the interpreter makes on its sink becomes one output line,
//! either as plain text or, with `--json`, as one JSON object per line.

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser};
use pdfgraft_core::interp::{
    DrawingSink, GlyphRun, GraphicsFrame, LineStyle, PathSegment, Shading, ShadingGeometry,
    TilePattern,
};
use pdfgraft_core::utils::{Matrix, Rect};
use pdfgraft_core::{Dict, FileResources, FileSource, Interpreter, ObjNum, PdfFile};
use serde::Serialize;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

/// A command line tool for replaying PDF page content.
#[derive(Parser, Debug)]
#[command(name = "replaypdf")]
#[command(author, version, about = "Replay PDF page content and trace drawing calls", long_about = None)]
struct Args {
    /// Path to the PDF file
    file: PathBuf,

    /// Use debug logging level
    #[arg(short = 'd', long, action = ArgAction::SetTrue)]
    debug: bool,

    /// Page numbers to replay (1-indexed). Use -p 1,2,3 or repeat the flag
    #[arg(short = 'p', long = "pages", value_delimiter = ',', action = ArgAction::Append)]
    pages: Vec<usize>,

    /// Print one JSON object per line
    #[arg(long = "json", action = ArgAction::SetTrue)]
    json: bool,
}

/// One sink call.
#[derive(Serialize, Debug)]
#[serde(tag = "op", rename_all = "snake_case")]
enum Trace<'a> {
    Page {
        page: usize,
    },
    SetCtm {
        ctm: [f64; 6],
    },
    Save,
    Restore,
    LineStyle {
        width: f64,
        cap: i64,
        join: i64,
        dash: &'a [f64],
    },
    Paint {
        stroke: bool,
        fill: bool,
        evenodd: bool,
        color: [f64; 3],
        segments: Vec<Segment>,
    },
    Clip {
        evenodd: bool,
        segments: Vec<Segment>,
    },
    Glyphs {
        font: &'a str,
        size: f64,
        codes: Vec<u32>,
        origin: [f64; 2],
    },
    Image {
        name: &'a str,
        width: Option<i64>,
        height: Option<i64>,
    },
    Shading {
        kind: &'static str,
        coords: &'a [f64],
    },
    BeginForm {
        name: &'a str,
        num: Option<ObjNum>,
        bbox: Option<[f64; 4]>,
        matrix: [f64; 6],
    },
    EndForm {
        name: &'a str,
    },
    BeginTile {
        name: &'a str,
        paint_type: i64,
        bbox: [f64; 4],
        step: [f64; 2],
    },
    EndTile {
        name: &'a str,
    },
}

/// Path segment as operator and operands, e.g. `["l", [10, 0]]`.
#[derive(Serialize, Debug)]
struct Segment(&'static str, Vec<f64>);

impl From<&PathSegment> for Segment {
    fn from(seg: &PathSegment) -> Self {
        match *seg {
            PathSegment::MoveTo(x, y) => Segment("m", vec![x, y]),
            PathSegment::LineTo(x, y) => Segment("l", vec![x, y]),
            PathSegment::CurveTo(x1, y1, x2, y2, x3, y3) => {
                Segment("c", vec![x1, y1, x2, y2, x3, y3])
            }
            PathSegment::ClosePath => Segment("h", Vec::new()),
        }
    }
}

fn matrix(m: Matrix) -> [f64; 6] {
    [m.0, m.1, m.2, m.3, m.4, m.5]
}

fn rect(r: Rect) -> [f64; 4] {
    [r.0, r.1, r.2, r.3]
}

fn segments(path: &[PathSegment]) -> Vec<Segment> {
    path.iter().map(Segment::from).collect()
}

/// Sink that writes a line per call. The first write error is kept and
/// later calls are dropped.
struct TracingSink<W: Write> {
    out: W,
    json: bool,
    error: Option<io::Error>,
}

impl<W: Write> TracingSink<W> {
    fn new(out: W, json: bool) -> Self {
        Self {
            out,
            json,
            error: None,
        }
    }

    fn emit(&mut self, trace: Trace<'_>) {
        if self.error.is_some() {
            return;
        }
        let written = if self.json {
            serde_json::to_writer(&mut self.out, &trace)
                .map_err(io::Error::from)
                .and_then(|()| writeln!(self.out))
        } else {
            writeln!(self.out, "{trace:?}")
        };
        if let Err(e) = written {
            self.error = Some(e);
        }
    }

    fn finish(mut self) -> io::Result<()> {
        match self.error.take() {
            Some(e) => Err(e),
            None => self.out.flush(),
        }
    }
}

impl<W: Write> DrawingSink for TracingSink<W> {
    fn set_ctm(&mut self, ctm: Matrix) {
        self.emit(Trace::SetCtm { ctm: matrix(ctm) });
    }

    fn save(&mut self) {
        self.emit(Trace::Save);
    }

    fn restore(&mut self) {
        self.emit(Trace::Restore);
    }

    fn update_line_style(&mut self, style: &LineStyle) {
        self.emit(Trace::LineStyle {
            width: style.width,
            cap: style.cap,
            join: style.join,
            dash: &style.dash_array,
        });
    }

    fn paint_path(
        &mut self,
        frame: &GraphicsFrame,
        stroke: bool,
        fill: bool,
        evenodd: bool,
        path: &[PathSegment],
    ) {
        let color = if fill { frame.fill } else { frame.stroke };
        self.emit(Trace::Paint {
            stroke,
            fill,
            evenodd,
            color: [color.r, color.g, color.b],
            segments: segments(path),
        });
    }

    fn clip_path(&mut self, _frame: &GraphicsFrame, evenodd: bool, path: &[PathSegment]) {
        self.emit(Trace::Clip {
            evenodd,
            segments: segments(path),
        });
    }

    fn draw_glyphs(&mut self, _frame: &GraphicsFrame, run: &GlyphRun) {
        let origin = run
            .glyphs
            .first()
            .map_or([run.transform.4, run.transform.5], |g| [g.x, g.y]);
        self.emit(Trace::Glyphs {
            font: &run.font_name,
            size: run.font_size,
            codes: run.glyphs.iter().map(|g| g.code).collect(),
            origin,
        });
    }

    fn draw_image(&mut self, name: &str, image: &Dict, _frame: &GraphicsFrame) {
        let width = image.get_integer("Width").or_else(|| image.get_integer("W"));
        let height = image.get_integer("Height").or_else(|| image.get_integer("H"));
        self.emit(Trace::Image {
            name,
            width,
            height,
        });
    }

    fn paint_shading(&mut self, _frame: &GraphicsFrame, shading: &Shading) {
        let (kind, coords) = match &shading.geometry {
            ShadingGeometry::Axial { coords } => ("axial", coords.as_slice()),
            ShadingGeometry::Radial { coords } => ("radial", coords.as_slice()),
        };
        self.emit(Trace::Shading { kind, coords });
    }

    fn begin_form(&mut self, name: &str, num: Option<ObjNum>, bbox: Option<Rect>, m: Matrix) {
        self.emit(Trace::BeginForm {
            name,
            num,
            bbox: bbox.map(rect),
            matrix: matrix(m),
        });
    }

    fn end_form(&mut self, name: &str) {
        self.emit(Trace::EndForm { name });
    }

    fn begin_tile(&mut self, tile: &TilePattern) -> bool {
        self.emit(Trace::BeginTile {
            name: &tile.name,
            paint_type: tile.paint_type,
            bbox: rect(tile.bbox),
            step: [tile.x_step, tile.y_step],
        });
        true
    }

    fn end_tile(&mut self, tile: &TilePattern) {
        self.emit(Trace::EndTile { name: &tile.name });
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if !args.file.exists() {
        bail!("File not found: {}", args.file.display());
    }

    let source = FileSource::open(&args.file)
        .with_context(|| format!("opening {}", args.file.display()))?;
    let file =
        PdfFile::load(source).with_context(|| format!("loading {}", args.file.display()))?;

    let pages: Vec<usize> = if args.pages.is_empty() {
        (0..file.count_pages()).collect()
    } else {
        args.pages.iter().map(|p| p.saturating_sub(1)).collect()
    };

    let mut sink = TracingSink::new(BufWriter::new(io::stdout().lock()), args.json);
    for index in pages {
        let Some(page) = file.page(index) else {
            eprintln!("Warning: page {} not found", index + 1);
            continue;
        };
        sink.emit(Trace::Page { page: index + 1 });
        let view = FileResources::for_page(&file, index);
        let mut interp = Interpreter::new(&mut sink, &view);
        interp.execute_page(&file, page);
    }
    sink.finish()?;
    Ok(())
}
