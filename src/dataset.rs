use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::decoder::{START, STOP};
use crate::error::Result;

/// One sentence with every column padded by the START/STOP sentinels, so
/// position 0 and position `len()-1` are always the sentinels and the real
/// tokens sit in between.
#[derive(Debug, Clone)]
pub struct DataPoint {
    pub tokens: Vec<String>,
    pub pos: Vec<String>,
    pub chunk: Vec<String>,
    pub gold_tags: Vec<String>,
}

impl DataPoint {
    pub fn new(
        tokens: Vec<String>,
        pos: Vec<String>,
        chunk: Vec<String>,
        gold_tags: Vec<String>,
    ) -> Self {
        Self {
            tokens: pad(tokens),
            pos: pad(pos),
            chunk: pad(chunk),
            gold_tags: pad(gold_tags),
        }
    }

    /// Padded length, sentinels included.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        // Two sentinels and nothing in between.
        self.tokens.len() <= 2
    }
}

fn pad(mut column: Vec<String>) -> Vec<String> {
    column.insert(0, START.to_string());
    column.push(STOP.to_string());
    column
}

/// Reads CoNLL-style data: one `word pos chunk tag` row per token, blank
/// line between sentences.
pub fn read_data(path: impl AsRef<Path>) -> Result<Vec<DataPoint>> {
    read_from(BufReader::new(File::open(path)?))
}

pub fn read_from(reader: impl BufRead) -> Result<Vec<DataPoint>> {
    let mut data = Vec::new();
    let mut rows: Vec<[String; 4]> = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            flush(&mut rows, &mut data);
            continue;
        }
        let mut fields = line.split_whitespace();
        match (fields.next(), fields.next(), fields.next(), fields.next()) {
            (Some(word), Some(pos), Some(chunk), Some(tag)) => rows.push([
                word.to_string(),
                pos.to_string(),
                chunk.to_string(),
                tag.to_string(),
            ]),
            _ => log::warn!("invalid line: {line}"),
        }
    }
    flush(&mut rows, &mut data);
    Ok(data)
}

fn flush(rows: &mut Vec<[String; 4]>, data: &mut Vec<DataPoint>) {
    if rows.is_empty() {
        return;
    }
    let mut tokens = Vec::with_capacity(rows.len());
    let mut pos = Vec::with_capacity(rows.len());
    let mut chunk = Vec::with_capacity(rows.len());
    let mut gold = Vec::with_capacity(rows.len());
    for [w, p, c, t] in rows.drain(..) {
        tokens.push(w);
        pos.push(p);
        chunk.push(c);
        gold.push(t);
    }
    data.push(DataPoint::new(tokens, pos, chunk, gold));
}
