//! In-memory documents shared by the integration tests.
//!
//! One logical object graph is written three ways: with a classic `xref`
//! table, with a compressed cross-reference stream plus an object stream,
//! and with no index at all.

#![allow(dead_code)]

use flate2::Compression;
use flate2::write::ZlibEncoder;
use std::io::Write;

pub const CONTENT: &[u8] = b"1 0 0 rg 0 0 100 100 re f";
pub const FORM_CONTENT: &[u8] = b"0 0 10 10 re f";

/// Objects that may sit inside an object stream.
pub fn plain_objects() -> Vec<(u32, Vec<u8>)> {
    vec![
        (1, b"<</Type /Catalog /Pages 2 0 R>>".to_vec()),
        (
            2,
            b"<</Type /Pages /Kids [3 0 R 4 0 R] /Count 2 /MediaBox [0 0 612 792] /Resources 6 0 R>>"
                .to_vec(),
        ),
        (3, b"<</Type /Page /Parent 2 0 R /Contents 5 0 R>>".to_vec()),
        (
            4,
            b"<</Type /Page /Parent 2 0 R /Contents 5 0 R /MediaBox [0 0 200 200]>>".to_vec(),
        ),
        (
            6,
            b"<</ProcSet [/PDF /Text] /Font <</F1 8 0 R>> /XObject <</Fm1 9 0 R>>>>".to_vec(),
        ),
        (
            8,
            b"<</Type /Font /Subtype /Type1 /BaseFont /Helvetica /FirstChar 32 /LastChar 34 /Widths [250 500 600]>>"
                .to_vec(),
        ),
    ]
}

/// Objects that must stay in the file body: the two streams and the
/// length object of the first one.
pub fn file_objects() -> Vec<(u32, Vec<u8>)> {
    vec![
        (7, CONTENT.len().to_string().into_bytes()),
        (5, stream_object("/Length 7 0 R", CONTENT)),
        (
            9,
            stream_object(
                &format!(
                    "/Type /XObject /Subtype /Form /BBox [0 0 10 10] /Resources <</Font <</F2 8 0 R>>>> /Length {}",
                    FORM_CONTENT.len()
                ),
                FORM_CONTENT,
            ),
        ),
    ]
}

/// Every object of the graph in file order. The length object comes
/// before the stream that uses it so a scan can resolve it.
pub fn graph() -> Vec<(u32, Vec<u8>)> {
    let mut objects = plain_objects();
    objects.extend(file_objects());
    objects
}

pub const GRAPH_NUMBERS: std::ops::RangeInclusive<u32> = 1..=9;

/// `<<entries>>` followed by a stream payload.
pub fn stream_object(entries: &str, payload: &[u8]) -> Vec<u8> {
    let mut out = format!("<<{entries}>>\nstream\n").into_bytes();
    out.extend_from_slice(payload);
    out.extend_from_slice(b"\nendstream");
    out
}

pub fn deflate(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

fn write_object(out: &mut Vec<u8>, num: u32, body: &[u8]) -> usize {
    let offset = out.len();
    out.extend_from_slice(format!("{num} 0 obj\n").as_bytes());
    out.extend_from_slice(body);
    out.extend_from_slice(b"\nendobj\n");
    offset
}

fn size_of(objects: &[(u32, Vec<u8>)]) -> u32 {
    objects.iter().map(|(n, _)| *n).max().unwrap_or(0) + 1
}

/// Objects followed by a classic table, `trailer` and `startxref`.
pub fn classic_table(objects: &[(u32, Vec<u8>)]) -> Vec<u8> {
    let mut out = b"%PDF-1.4\n".to_vec();
    let size = size_of(objects);
    let mut offsets = vec![0usize; size as usize];
    for (num, body) in objects {
        offsets[*num as usize] = write_object(&mut out, *num, body);
    }
    let xref = out.len();
    out.extend_from_slice(format!("xref\n0 {size}\n").as_bytes());
    for (num, off) in offsets.iter().enumerate() {
        if num == 0 || *off == 0 {
            out.extend_from_slice(b"0000000000 65535 f \n");
        } else {
            out.extend_from_slice(format!("{off:010} 00000 n \n").as_bytes());
        }
    }
    out.extend_from_slice(format!("trailer\n<</Size {size} /Root 1 0 R>>\n").as_bytes());
    out.extend_from_slice(format!("startxref\n{xref}\n%%EOF\n").as_bytes());
    out
}

/// Objects followed by a bare trailer, no table and no `startxref`.
pub fn no_index(objects: &[(u32, Vec<u8>)]) -> Vec<u8> {
    let mut out = b"%PDF-1.4\n".to_vec();
    for (num, body) in objects {
        write_object(&mut out, *num, body);
    }
    out.extend_from_slice(
        format!("trailer\n<</Size {} /Root 1 0 R>>\n%%EOF\n", size_of(objects)).as_bytes(),
    );
    out
}

/// Object-stream dictionary and payload holding `objects`, compressed.
pub fn object_stream(objects: &[(u32, Vec<u8>)]) -> Vec<u8> {
    let mut directory = String::new();
    let mut bodies = Vec::new();
    for (num, body) in objects {
        directory.push_str(&format!("{num} {} ", bodies.len()));
        bodies.extend_from_slice(body);
        bodies.push(b' ');
    }
    let first = directory.len();
    let mut payload = directory.into_bytes();
    payload.extend_from_slice(&bodies);
    let compressed = deflate(&payload);
    stream_object(
        &format!(
            "/Type /ObjStm /N {} /First {first} /Filter /FlateDecode /Length {}",
            objects.len(),
            compressed.len()
        ),
        &compressed,
    )
}

/// The graph with its plain objects packed into object stream 10 and a
/// compressed cross-reference stream as object 11.
pub fn xref_stream() -> Vec<u8> {
    const CONTAINER: u32 = 10;
    const XREF: u32 = 11;
    const SIZE: u32 = 12;

    let packed = plain_objects();
    let mut out = b"%PDF-1.5\n".to_vec();
    // (type, field1, field2) per object number
    let mut records = vec![(0u8, 0u32, 65535u16); SIZE as usize];
    for (num, body) in file_objects() {
        records[num as usize] = (1, write_object(&mut out, num, &body) as u32, 0);
    }
    records[CONTAINER as usize] = (1, write_object(&mut out, CONTAINER, &object_stream(&packed)) as u32, 0);
    for (index, (num, _)) in packed.iter().enumerate() {
        records[*num as usize] = (2, CONTAINER, index as u16);
    }
    let xref_offset = out.len();
    records[XREF as usize] = (1, xref_offset as u32, 0);

    let mut table = Vec::new();
    for (kind, field1, field2) in records {
        table.push(kind);
        table.extend_from_slice(&field1.to_be_bytes());
        table.extend_from_slice(&field2.to_be_bytes());
    }
    let compressed = deflate(&table);
    let body = stream_object(
        &format!(
            "/Type /XRef /Size {SIZE} /W [1 4 2] /Root 1 0 R /Filter /FlateDecode /Length {}",
            compressed.len()
        ),
        &compressed,
    );
    write_object(&mut out, XREF, &body);
    out.extend_from_slice(format!("startxref\n{xref_offset}\n%%EOF\n").as_bytes());
    out
}
