use arbor_protocol::{NodeId, Tree};
use nom::{
    branch::alt,
    bytes::complete::take_while1,
    character::complete::{char, multispace0},
    combinator::map,
    IResult,
};
use tracing::debug;

use crate::error::ParseError;
use crate::token::{Span, TreeToken};

fn is_atom_char(c: char) -> bool {
    !c.is_whitespace() && c != '(' && c != ')'
}

/// Splits bracketed tree text into parentheses and atoms.
pub fn tokenize(original_input: &str) -> Vec<(Span, TreeToken<'_>)> {
    let mut input = original_input;
    let mut result = Vec::new();

    loop {
        let (next_input, _) = match multispace0::<&str, nom::error::Error<&str>>(input) {
            Ok(res) => res,
            Err(_) => break,
        };
        input = next_input;

        if input.is_empty() {
            break;
        }

        let parse_res: IResult<&str, TreeToken> = alt((
            map(char('('), |_| TreeToken::Open),
            map(char(')'), |_| TreeToken::Close),
            map(take_while1(is_atom_char), TreeToken::Atom),
        ))(input);

        match parse_res {
            Ok((next_input, token)) => {
                let len = input.len() - next_input.len();
                let start = input.as_ptr() as usize - original_input.as_ptr() as usize;
                result.push((Span::new(start, start + len), token));
                input = next_input;
            }
            Err(_) => break,
        }
    }

    result
}

struct TreeReader<'a> {
    tokens: Vec<(Span, TreeToken<'a>)>,
    end: usize,
    pos: usize,
}

impl<'a> TreeReader<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            tokens: tokenize(text),
            end: text.len(),
            pos: 0,
        }
    }

    fn malformed(position: usize, reason: &str) -> ParseError {
        ParseError::MalformedTree {
            position,
            reason: reason.to_string(),
        }
    }

    fn next_tree(&mut self) -> Result<Option<Tree>, ParseError> {
        let (span, token) = match self.tokens.get(self.pos) {
            Some(entry) => *entry,
            None => return Ok(None),
        };
        if token != TreeToken::Open {
            return Err(Self::malformed(span.start, "expected `(`"));
        }
        self.pos += 1;

        // `( (S ...))` has an empty top label
        let label = match self.tokens.get(self.pos) {
            Some((_, TreeToken::Atom(label))) => {
                self.pos += 1;
                label.to_string()
            }
            _ => "ROOT".to_string(),
        };
        let mut tree = Tree::new(label);
        let root = tree.root();
        self.read_children(&mut tree, root)?;
        tree.index_words();
        Ok(Some(tree))
    }

    fn read_children(&mut self, tree: &mut Tree, parent: NodeId) -> Result<(), ParseError> {
        loop {
            let (span, token) = match self.tokens.get(self.pos) {
                Some(entry) => *entry,
                None => return Err(Self::malformed(self.end, "unbalanced parentheses")),
            };
            self.pos += 1;
            match token {
                TreeToken::Close => return Ok(()),
                TreeToken::Atom(word) => {
                    tree.add_child(parent, word);
                }
                TreeToken::Open => {
                    let label = match self.tokens.get(self.pos) {
                        Some((_, TreeToken::Atom(label))) => *label,
                        _ => return Err(Self::malformed(span.start, "missing node label")),
                    };
                    self.pos += 1;
                    let child = tree.add_child(parent, label);
                    self.read_children(tree, child)?;
                }
            }
        }
    }
}

/// Reads every bracketed tree in `text`; words are indexed 1..=n per tree.
pub fn read_trees(text: &str) -> Result<Vec<Tree>, ParseError> {
    let mut reader = TreeReader::new(text);
    let mut trees = Vec::new();
    while let Some(tree) = reader.next_tree()? {
        trees.push(tree);
    }
    debug!(count = trees.len(), "read trees");
    Ok(trees)
}

/// Reads exactly one tree.
pub fn read_tree(text: &str) -> Result<Tree, ParseError> {
    let mut trees = read_trees(text)?;
    match trees.len() {
        1 => Ok(trees.remove(0)),
        0 => Err(TreeReader::malformed(0, "no tree found")),
        _ => Err(TreeReader::malformed(0, "more than one tree found")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_and_print() {
        let text = "(ROOT (S (NP (NNP Sam)) (VP (VBD died) (NP-TMP (NN today)))))";
        let tree = read_tree(text).unwrap();
        assert_eq!(tree.to_string(), text);
        assert_eq!(tree.leaves().len(), 3);
        assert_eq!(tree.word_index(tree.leaf_at(3).unwrap()), Some(3));
    }

    #[test]
    fn test_empty_top_label_becomes_root() {
        let tree = read_tree("( (S (NP (PRP It)) (VP (VBZ works))))").unwrap();
        assert_eq!(tree.label(tree.root()), "ROOT");
    }

    #[test]
    fn test_multiple_trees() {
        let trees = read_trees("(S (NN a))\n\n(S (NN b))").unwrap();
        assert_eq!(trees.len(), 2);
        assert_eq!(trees[1].label(trees[1].leaves()[0]), "b");
    }

    #[test]
    fn test_punctuation_atoms() {
        let tree = read_tree("(S (-LRB- -LRB-) (, ,) (. .))").unwrap();
        let labels: Vec<&str> = tree.leaves().iter().map(|&l| tree.label(l)).collect();
        assert_eq!(labels, vec!["-LRB-", ",", "."]);
    }

    #[test]
    fn test_unbalanced_is_malformed() {
        let text = "(S (NP (NN dog))";
        assert_eq!(
            read_tree(text),
            Err(ParseError::MalformedTree {
                position: text.len(),
                reason: "unbalanced parentheses".to_string()
            })
        );
        assert!(matches!(read_tree("dog"), Err(ParseError::MalformedTree { position: 0, .. })));
        assert!(matches!(read_tree("(S (( x)))"), Err(ParseError::MalformedTree { position: 3, .. })));
    }
}
