//! A compact tree-pattern language in the Tregex tradition.
//!
//! ```text
//! S < (@NP=target $++ VP)
//! NP < (NN|NNP|NNS=target $+ /^NN/)
//! ```
//!
//! A pattern is a node description followed by relation constraints that
//! all apply to that node; parentheses give a target its own constraints.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while1, take_while_m_n},
    character::complete::{char, multispace0},
    combinator::{all_consuming, map, opt, recognize},
    multi::{many0, separated_list1},
    sequence::{delimited, pair, preceded, tuple},
    IResult,
};

use crate::error::ParseError;

/// What a single node must look like.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeDesc {
    /// `__`
    Any,
    /// `A|B`: exact label match.
    Labels(Vec<String>),
    /// `@A|B`: match on the basic category.
    Basic(Vec<String>),
    /// `/re/`: regex search on the label.
    Regex(String),
}

/// Relation operators, read as `A op B`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelOp {
    /// `<` B is a child of A
    Child,
    /// `>` B is the parent of A
    Parent,
    /// `<<`
    Dominates,
    /// `>>`
    DominatedBy,
    /// `<,` B is the first child of A
    FirstChild,
    /// `<-` B is the last child of A
    LastChild,
    /// `<:` B is the only child of A
    OnlyChild,
    /// `<#` B is the head child of A
    HeadChild,
    /// `>#` A is the head child of B
    HeadOf,
    /// `$` B is a sister of A
    Sister,
    /// `$+` B immediately follows A
    NextSister,
    /// `$-` B immediately precedes A
    PreviousSister,
    /// `$++` B follows A
    FollowingSister,
    /// `$--` B precedes A
    PrecedingSister,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    pub negated: bool,
    pub op: RelOp,
    pub target: Pattern,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    pub node: NodeDesc,
    pub name: Option<String>,
    pub constraints: Vec<Constraint>,
}

impl Pattern {
    /// Every `=name` bound anywhere in the pattern.
    pub fn names(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_names(&mut out);
        out
    }

    fn collect_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        if let Some(name) = &self.name {
            out.push(name);
        }
        for c in &self.constraints {
            c.target.collect_names(out);
        }
    }

    /// All regex bodies, for compiling up front.
    pub fn regexes(&self) -> Vec<&str> {
        let mut out = Vec::new();
        if let NodeDesc::Regex(re) = &self.node {
            out.push(re.as_str());
        }
        for c in &self.constraints {
            out.extend(c.target.regexes());
        }
        out
    }
}

fn is_label_start(c: char) -> bool {
    !c.is_whitespace() && !"()|=!<>$/@".contains(c)
}

fn is_label_char(c: char) -> bool {
    !c.is_whitespace() && !"()|=!<>".contains(c)
}

fn label(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        take_while_m_n(1, 1, is_label_start),
        take_while(is_label_char),
    ))(input)
}

fn labels(input: &str) -> IResult<&str, Vec<String>> {
    map(separated_list1(char('|'), label), |ls| {
        ls.into_iter().map(str::to_string).collect()
    })(input)
}

/// Body of `/.../`; `\/` escapes a slash.
fn regex_body(input: &str) -> IResult<&str, &str> {
    let mut escaped = false;
    for (i, c) in input.char_indices() {
        match c {
            '\\' if !escaped => escaped = true,
            '/' if !escaped => return Ok((&input[i..], &input[..i])),
            _ => escaped = false,
        }
    }
    Err(nom::Err::Error(nom::error::Error::new(
        input,
        nom::error::ErrorKind::TakeUntil,
    )))
}

fn regex(input: &str) -> IResult<&str, String> {
    map(delimited(char('/'), regex_body, char('/')), |body| {
        body.replace("\\/", "/")
    })(input)
}

fn node_desc(input: &str) -> IResult<&str, NodeDesc> {
    alt((
        map(tag("__"), |_| NodeDesc::Any),
        map(preceded(char('@'), labels), NodeDesc::Basic),
        map(regex, NodeDesc::Regex),
        map(labels, NodeDesc::Labels),
    ))(input)
}

fn name(input: &str) -> IResult<&str, &str> {
    preceded(
        char('='),
        take_while1(|c: char| c.is_alphanumeric() || c == '_'),
    )(input)
}

fn rel_op(input: &str) -> IResult<&str, RelOp> {
    alt((
        map(tag("<<"), |_| RelOp::Dominates),
        map(tag("<,"), |_| RelOp::FirstChild),
        map(tag("<-"), |_| RelOp::LastChild),
        map(tag("<:"), |_| RelOp::OnlyChild),
        map(tag("<#"), |_| RelOp::HeadChild),
        map(tag("<"), |_| RelOp::Child),
        map(tag(">>"), |_| RelOp::DominatedBy),
        map(tag(">#"), |_| RelOp::HeadOf),
        map(tag(">"), |_| RelOp::Parent),
        map(tag("$++"), |_| RelOp::FollowingSister),
        map(tag("$--"), |_| RelOp::PrecedingSister),
        map(tag("$+"), |_| RelOp::NextSister),
        map(tag("$-"), |_| RelOp::PreviousSister),
        map(tag("$"), |_| RelOp::Sister),
    ))(input)
}

fn node(input: &str) -> IResult<&str, Pattern> {
    alt((
        delimited(
            pair(char('('), multispace0),
            pattern,
            pair(multispace0, char(')')),
        ),
        map(pair(node_desc, opt(name)), |(node, name)| Pattern {
            node,
            name: name.map(str::to_string),
            constraints: Vec::new(),
        }),
    ))(input)
}

fn constraint(input: &str) -> IResult<&str, Constraint> {
    map(
        tuple((multispace0, opt(char('!')), rel_op, multispace0, node)),
        |(_, bang, op, _, target)| Constraint {
            negated: bang.is_some(),
            op,
            target,
        },
    )(input)
}

fn pattern(input: &str) -> IResult<&str, Pattern> {
    let (input, mut head) = node(input)?;
    let (input, more) = many0(constraint)(input)?;
    head.constraints.extend(more);
    Ok((input, head))
}

/// Parses a whole pattern string.
pub fn parse_pattern(text: &str) -> Result<Pattern, ParseError> {
    let bad = |reason: String| ParseError::BadPattern {
        pattern: text.to_string(),
        reason,
    };
    match all_consuming(delimited(multispace0, pattern, multispace0))(text) {
        Ok((_, p)) => Ok(p),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
            let offset = text.len() - e.input.len();
            Err(bad(format!("unexpected input at byte {offset}")))
        }
        Err(nom::Err::Incomplete(_)) => Err(bad("incomplete pattern".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(desc: NodeDesc, name: Option<&str>) -> Pattern {
        Pattern {
            node: desc,
            name: name.map(str::to_string),
            constraints: vec![],
        }
    }

    #[test]
    fn test_subject_pattern() {
        let p = parse_pattern("S < (@NP=target $++ VP)").unwrap();
        assert_eq!(p.node, NodeDesc::Labels(vec!["S".to_string()]));
        assert_eq!(p.constraints.len(), 1);
        let np = &p.constraints[0].target;
        assert_eq!(np.node, NodeDesc::Basic(vec!["NP".to_string()]));
        assert_eq!(np.name.as_deref(), Some("target"));
        assert_eq!(np.constraints[0].op, RelOp::FollowingSister);
        assert_eq!(np.constraints[0].target, leaf(NodeDesc::Labels(vec!["VP".to_string()]), None));
        assert_eq!(p.names(), vec!["target"]);
    }

    #[test]
    fn test_alternation_regex_and_negation() {
        let p = parse_pattern("NP < (NN|NNP=target $+ /^NN/) !< POS").unwrap();
        assert_eq!(p.constraints.len(), 2);
        let first = &p.constraints[0].target;
        assert_eq!(first.node, NodeDesc::Labels(vec!["NN".to_string(), "NNP".to_string()]));
        assert_eq!(first.constraints[0].op, RelOp::NextSister);
        assert_eq!(first.constraints[0].target.node, NodeDesc::Regex("^NN".to_string()));
        assert!(p.constraints[1].negated);
        assert_eq!(p.regexes(), vec!["^NN"]);
    }

    #[test]
    fn test_operators_without_spaces() {
        let p = parse_pattern("VP<<NN>VP $--DT<,MD<-NP<#VB>#S<:X $ X $+ Y $- Z").unwrap();
        let ops: Vec<RelOp> = p.constraints.iter().map(|c| c.op).collect();
        assert_eq!(
            ops,
            vec![
                RelOp::Dominates,
                RelOp::Parent,
                RelOp::PrecedingSister,
                RelOp::FirstChild,
                RelOp::LastChild,
                RelOp::HeadChild,
                RelOp::HeadOf,
                RelOp::OnlyChild,
                RelOp::Sister,
                RelOp::NextSister,
                RelOp::PreviousSister,
            ]
        );
    }

    #[test]
    fn test_labels_with_symbols() {
        let p = parse_pattern("NP < PRP$=target < NP-TMP < -LRB- < ''").unwrap();
        let targets: Vec<&NodeDesc> = p.constraints.iter().map(|c| &c.target.node).collect();
        assert_eq!(targets[0], &NodeDesc::Labels(vec!["PRP$".to_string()]));
        assert_eq!(targets[1], &NodeDesc::Labels(vec!["NP-TMP".to_string()]));
        assert_eq!(targets[2], &NodeDesc::Labels(vec!["-LRB-".to_string()]));
        assert_eq!(targets[3], &NodeDesc::Labels(vec!["''".to_string()]));
    }

    #[test]
    fn test_escaped_slash_in_regex() {
        let p = parse_pattern(r"__ < /a\/b/=target").unwrap();
        assert_eq!(p.node, NodeDesc::Any);
        assert_eq!(p.constraints[0].target.node, NodeDesc::Regex("a/b".to_string()));
    }

    #[test]
    fn test_bad_patterns() {
        assert!(matches!(parse_pattern("S < (NP"), Err(ParseError::BadPattern { .. })));
        assert!(matches!(parse_pattern("S <"), Err(ParseError::BadPattern { .. })));
        assert!(matches!(parse_pattern("< NP"), Err(ParseError::BadPattern { .. })));
        assert!(matches!(parse_pattern("S < /open"), Err(ParseError::BadPattern { .. })));
    }
}
