use std::fmt;

use arbor_protocol::IndexedWord;
use nom::{
    character::complete::{char, digit1},
    combinator::{all_consuming, map_res},
    multi::many0_count,
    sequence::pair,
    IResult,
};

use crate::error::ParseError;

/// One `reln(gov-i, dep-j)` line, relation kept as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyLine {
    pub relation: String,
    pub governor: IndexedWord,
    pub dependent: IndexedWord,
}

impl fmt::Display for DependencyLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}, {})", self.relation, self.governor, self.dependent)
    }
}

/// `12''` -> (12, 2)
fn index_with_primes(input: &str) -> IResult<&str, (u32, u32)> {
    pair(
        map_res(digit1, |d: &str| d.parse::<u32>()),
        map_res(many0_count(char('\'')), |n: usize| u32::try_from(n)),
    )(input)
}

fn parse_word(arg: &str, line: &str) -> Result<IndexedWord, ParseError> {
    let malformed = || ParseError::MalformedDependency(line.to_string());
    let (word, position) = arg.rsplit_once('-').ok_or_else(malformed)?;
    let (_, (index, copies)) = all_consuming(index_with_primes)(position).map_err(|_| malformed())?;
    Ok(IndexedWord::new(index, word, None).with_copy(copies))
}

/// Parses `reln(gov-i, dep-j)`; indices may carry primes for copies.
pub fn parse_dependency_line(line: &str) -> Result<DependencyLine, ParseError> {
    let trimmed = line.trim();
    let malformed = || ParseError::MalformedDependency(line.to_string());

    let open = trimmed.find('(').ok_or_else(malformed)?;
    let inner = trimmed[open + 1..].strip_suffix(')').ok_or_else(malformed)?;
    let relation = &trimmed[..open];
    if relation.is_empty() {
        return Err(malformed());
    }
    let (gov, dep) = inner.split_once(", ").ok_or_else(malformed)?;

    Ok(DependencyLine {
        relation: relation.to_string(),
        governor: parse_word(gov, line)?,
        dependent: parse_word(dep, line)?,
    })
}
