//! Text loaders for knapsack problem files.
//!
//! Two formats are understood.
//!
//! The shaped format starts with the weight capacity, followed by the
//! container rows (`_` free, anything else blocked) up to a blank line. Then
//! come item blocks: a `weight price` header line and the shape rows (`@`
//! occupied) up to the next blank line or the end of the file.
//!
//! ```text
//! 10
//! ___#
//! ____
//!
//! 3 5
//! @@
//!
//! 2 4
//! @
//! @@
//! ```
//!
//! The classic format holds `n capacity` followed by `n` pairs of
//! `weight price`, separated by any whitespace.

use std::fs;
use std::iter::Peekable;
use std::path::Path;

use thiserror::Error;

use crate::knapsack::ClassicItem;
use crate::model::{Container, Item, Problem, ValidationError};
use crate::types::{ContainerGrid, ShapeGrid};

/// Errors that can occur while loading a problem.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Missing weight capacity at the start of the input")]
    MissingCapacity,

    #[error("Line {line}: expected a non-negative integer, got '{value}'")]
    InvalidInteger { line: usize, value: String },

    #[error("Line {line}: expected 'weight price', got '{content}'")]
    InvalidItemHeader { line: usize, content: String },

    #[error("Container has no rows")]
    EmptyContainer,

    #[error("Item {index} (line {line}) has no shape rows")]
    MissingShape { index: usize, line: usize },

    #[error("Item {index}: {source}")]
    InvalidItem {
        index: usize,
        #[source]
        source: ValidationError,
    },

    #[error(transparent)]
    InvalidContainer(#[from] ValidationError),

    #[error("Unexpected end of input: expected {expected}")]
    UnexpectedEof { expected: String },
}

/// A classic (shapeless) knapsack problem.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassicProblem {
    pub capacity: u64,
    pub items: Vec<ClassicItem>,
}

/// Reads and parses a shaped problem file.
pub fn load_problem(path: impl AsRef<Path>) -> Result<Problem, LoadError> {
    let content = fs::read_to_string(path)?;
    parse_problem(&content)
}

/// Reads and parses a classic problem file.
pub fn load_classic(path: impl AsRef<Path>) -> Result<ClassicProblem, LoadError> {
    let content = fs::read_to_string(path)?;
    parse_classic(&content)
}

/// Parses a shaped problem from text.
pub fn parse_problem(text: &str) -> Result<Problem, LoadError> {
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line))
        .peekable();

    skip_blank(&mut lines);
    let (line_no, first) = lines.next().ok_or(LoadError::MissingCapacity)?;
    let capacity_token = first
        .split_whitespace()
        .next()
        .ok_or(LoadError::MissingCapacity)?;
    let capacity = parse_integer(capacity_token, line_no)?;

    let rows = take_block(&mut lines);
    if rows.is_empty() {
        return Err(LoadError::EmptyContainer);
    }
    let container = Container::new(ContainerGrid::container_from_lines(&rows), capacity)?;

    let mut items = Vec::new();
    loop {
        skip_blank(&mut lines);
        let Some((line_no, header)) = lines.next() else {
            break;
        };
        let (weight, price) = parse_item_header(header, line_no)?;
        let index = items.len();

        let shape = take_block(&mut lines);
        if shape.is_empty() {
            return Err(LoadError::MissingShape {
                index,
                line: line_no,
            });
        }
        let item = Item::new(weight, price, ShapeGrid::shape_from_lines(&shape))
            .map_err(|source| LoadError::InvalidItem { index, source })?;
        items.push(item);
    }

    tracing::debug!(
        capacity,
        rows = container.grid.rows(),
        cols = container.grid.cols(),
        items = items.len(),
        "parsed shaped problem"
    );
    Ok(Problem { container, items })
}

/// Parses a classic problem from text.
pub fn parse_classic(text: &str) -> Result<ClassicProblem, LoadError> {
    let mut tokens = text
        .lines()
        .enumerate()
        .flat_map(|(i, line)| line.split_whitespace().map(move |t| (i + 1, t)));

    let mut next_integer = |expected: &str| -> Result<u64, LoadError> {
        let (line, token) = tokens.next().ok_or_else(|| LoadError::UnexpectedEof {
            expected: expected.to_string(),
        })?;
        parse_integer(token, line)
    };

    let count = next_integer("item count")?;
    let capacity = next_integer("weight capacity")?;
    let mut items = Vec::new();
    for index in 0..count {
        let weight = next_integer(&format!("weight of item {}", index))?;
        let price = next_integer(&format!("price of item {}", index))?;
        items.push(ClassicItem { weight, price });
    }

    Ok(ClassicProblem { capacity, items })
}

fn skip_blank<'a, I>(lines: &mut Peekable<I>)
where
    I: Iterator<Item = (usize, &'a str)>,
{
    while lines.next_if(|(_, line)| line.trim().is_empty()).is_some() {}
}

/// Takes lines up to (and consuming) the next blank line or the end of input.
fn take_block<'a, I>(lines: &mut Peekable<I>) -> Vec<&'a str>
where
    I: Iterator<Item = (usize, &'a str)>,
{
    let mut block = Vec::new();
    for (_, line) in lines.by_ref() {
        if line.trim().is_empty() {
            break;
        }
        block.push(line);
    }
    block
}

fn parse_item_header(header: &str, line: usize) -> Result<(u64, u64), LoadError> {
    let parts: Vec<&str> = header.split_whitespace().collect();
    match parts.as_slice() {
        [weight, price] => Ok((parse_integer(weight, line)?, parse_integer(price, line)?)),
        _ => Err(LoadError::InvalidItemHeader {
            line,
            content: header.to_string(),
        }),
    }
}

fn parse_integer(token: &str, line: usize) -> Result<u64, LoadError> {
    token.parse::<u64>().map_err(|_| LoadError::InvalidInteger {
        line,
        value: token.to_string(),
    })
}
