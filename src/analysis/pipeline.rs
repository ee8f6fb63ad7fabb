//! Pipeline analyzer: lazy cartesian composition of analyzers.
//!
//! Every token of each member is fed as input to the next member, depth
//! first, so the stream is the lexicographic concatenation of cartesian
//! products of the members' outputs. Offsets project back into the original
//! input; external positions are strictly monotone across the whole stream.

use log::warn;

use crate::analysis::analyzer::{Analyzer, MAX_INPUT_BYTES};
use crate::analysis::token::Token;
use crate::error::{Result, SagittaError};

struct Member {
    analyzer: Box<dyn Analyzer>,

    // Current token, projected into the original input.
    term: String,
    abs_start: u32,
    abs_end: u32,
    increment: u32,
    /// Whether a child consuming this token may refine offsets within it.
    token_mapped: bool,

    // Current input binding.
    base: u32,
    input_start: u32,
    input_end: u32,
    /// Whether this member's token offsets resolve into the original input.
    mapped: bool,
}

impl Member {
    fn new(analyzer: Box<dyn Analyzer>) -> Self {
        Member {
            analyzer,
            term: String::new(),
            abs_start: 0,
            abs_end: 0,
            increment: 0,
            token_mapped: false,
            base: 0,
            input_start: 0,
            input_end: 0,
            mapped: false,
        }
    }

    fn reset(&mut self, input: &str, abs_start: u32, abs_end: u32, mapped: bool) -> bool {
        if !self.analyzer.reset(input) {
            return false;
        }
        self.base = abs_start;
        self.input_start = abs_start;
        self.input_end = abs_end;
        self.mapped = mapped;
        true
    }

    fn advance(&mut self) -> bool {
        if !self.analyzer.next() {
            return false;
        }
        let token = self.analyzer.token();

        // A modifier's children all inherit its whole range; refining
        // within it would index into a value that no longer exists in the
        // original input.
        if self.mapped {
            self.abs_start = self.base + token.start;
            self.abs_end = self.base + token.end;
        } else {
            self.abs_start = self.input_start;
            self.abs_end = self.input_end;
        }
        self.token_mapped = self.mapped && token.term.len() as u32 == token.end - token.start;
        self.increment = token.increment;
        self.term.clear();
        self.term.push_str(&token.term);
        true
    }
}

/// An analyzer composing an ordered, non-empty list of sub-analyzers.
///
/// A pipeline is itself an [`Analyzer`], so pipelines nest. A single member
/// is identity forwarding.
///
/// # Examples
///
/// ```
/// use sagitta::analysis::analyzer::Analyzer;
/// use sagitta::analysis::ngram::NgramAnalyzer;
/// use sagitta::analysis::norm::{CaseConvert, NormAnalyzer};
/// use sagitta::analysis::pipeline::PipelineAnalyzer;
///
/// let mut pipeline = PipelineAnalyzer::new(vec![
///     Box::new(NormAnalyzer::new(CaseConvert::Upper, false)) as Box<dyn Analyzer>,
///     Box::new(NgramAnalyzer::new(2, 2, false).unwrap()),
/// ])
/// .unwrap();
///
/// assert!(pipeline.reset("abc"));
/// let mut terms = Vec::new();
/// while pipeline.next() {
///     terms.push(pipeline.token().term.clone());
/// }
/// assert_eq!(terms, vec!["AB", "BC"]);
/// ```
pub struct PipelineAnalyzer {
    members: Vec<Member>,
    current: usize,
    exhausted: bool,
    token: Token,
}

impl PipelineAnalyzer {
    /// Compose `analyzers` into a pipeline. Fails on an empty list.
    pub fn new(analyzers: Vec<Box<dyn Analyzer>>) -> Result<Self> {
        if analyzers.is_empty() {
            return Err(SagittaError::config("pipeline requires at least one analyzer"));
        }
        Ok(PipelineAnalyzer {
            members: analyzers.into_iter().map(Member::new).collect(),
            current: 0,
            exhausted: true,
            token: Token::default(),
        })
    }

    /// Number of composed analyzers.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// A pipeline is never empty.
    pub fn is_empty(&self) -> bool {
        false
    }
}

impl Analyzer for PipelineAnalyzer {
    fn reset(&mut self, input: &str) -> bool {
        if input.len() > MAX_INPUT_BYTES {
            self.exhausted = true;
            return false;
        }
        if !self.members[0].reset(input, 0, input.len() as u32, true) {
            self.exhausted = true;
            return false;
        }
        self.current = 0;
        self.exhausted = false;
        true
    }

    fn next(&mut self) -> bool {
        if self.exhausted {
            return false;
        }

        'emit: loop {
            // Advance the deepest positioned member, popping to the parent
            // when a member runs dry.
            let mut rollback = false;
            while !self.members[self.current].advance() {
                if self.current == 0 {
                    self.exhausted = true;
                    return false;
                }
                self.current -= 1;
                rollback = true;
            }
            let mut increment = self.members[self.current].increment;

            // Re-bind every deeper member to the new branch. A member
            // yielding nothing for this value forces another advance.
            while self.current + 1 < self.members.len() {
                let (parents, rest) = self.members.split_at_mut(self.current + 1);
                let parent = &parents[self.current];
                let child = &mut rest[0];
                if !child.reset(
                    &parent.term,
                    parent.abs_start,
                    parent.abs_end,
                    parent.token_mapped,
                ) {
                    warn!(
                        "pipeline member {:?} rejected value of {} bytes",
                        child.analyzer.name(),
                        parent.term.len()
                    );
                    self.exhausted = true;
                    return false;
                }
                self.current += 1;
                if !self.members[self.current].advance() {
                    continue 'emit;
                }
                // The child's first token shares the parent's position
                // rather than opening a new one.
                increment += self.members[self.current].increment.saturating_sub(1);
            }

            // A branch reached after exhausting deeper members must land
            // strictly after everything already emitted.
            if rollback {
                increment = increment.max(1);
            }

            let leaf = &self.members[self.current];
            self.token
                .set(&leaf.term, leaf.abs_start, leaf.abs_end, increment);
            return true;
        }
    }

    fn token(&self) -> &Token {
        &self.token
    }

    fn name(&self) -> &'static str {
        "pipeline"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::delimiter::DelimiterAnalyzer;
    use crate::analysis::ngram::NgramAnalyzer;
    use crate::analysis::norm::{CaseConvert, NormAnalyzer};

    fn drain(pipeline: &mut PipelineAnalyzer, input: &str) -> Vec<(String, u32, u32, u32)> {
        assert!(pipeline.reset(input));
        let mut out = Vec::new();
        let mut pos = u32::MAX;
        while pipeline.next() {
            let t = pipeline.token();
            pos = pos.wrapping_add(t.increment);
            out.push((t.term.clone(), t.start, t.end, pos));
        }
        out
    }

    fn token(term: &str, start: u32, end: u32, pos: u32) -> (String, u32, u32, u32) {
        (term.to_string(), start, end, pos)
    }

    #[test]
    fn test_empty_pipeline_rejected() {
        assert!(PipelineAnalyzer::new(Vec::new()).is_err());
    }

    #[test]
    fn test_single_member_is_identity() {
        let mut pipeline = PipelineAnalyzer::new(vec![
            Box::new(DelimiterAnalyzer::new(",".to_string())) as Box<dyn Analyzer>,
        ])
        .unwrap();
        let tokens = drain(&mut pipeline, "a,b");

        assert_eq!(tokens, vec![token("a", 0, 1, 0), token("b", 2, 3, 1)]);
    }

    #[test]
    fn test_two_normalizers_single_token() {
        let mut pipeline = PipelineAnalyzer::new(vec![
            Box::new(NormAnalyzer::new(CaseConvert::Upper, false)) as Box<dyn Analyzer>,
            Box::new(NormAnalyzer::new(CaseConvert::Lower, false)),
        ])
        .unwrap();
        let tokens = drain(&mut pipeline, "QuIck");

        assert_eq!(tokens, vec![token("quick", 0, 5, 0)]);
    }

    #[test]
    fn test_overlapping_ngram_of_ngram_positions() {
        let mut pipeline = PipelineAnalyzer::new(vec![
            Box::new(NgramAnalyzer::new(6, 7, false).unwrap()) as Box<dyn Analyzer>,
            Box::new(NgramAnalyzer::new(2, 3, false).unwrap()),
        ])
        .unwrap();
        let tokens = drain(&mut pipeline, "ABCDEFJH");

        let expected = vec![
            token("AB", 0, 2, 0),
            token("ABC", 0, 3, 0),
            token("BC", 1, 3, 1),
            token("BCD", 1, 4, 1),
            token("CD", 2, 4, 2),
            token("CDE", 2, 5, 2),
            token("DE", 3, 5, 3),
            token("DEF", 3, 6, 3),
            token("EF", 4, 6, 4),
            token("AB", 0, 2, 5),
            token("ABC", 0, 3, 5),
            token("BC", 1, 3, 6),
            token("BCD", 1, 4, 6),
            token("CD", 2, 4, 7),
            token("CDE", 2, 5, 7),
            token("DE", 3, 5, 8),
            token("DEF", 3, 6, 8),
            token("EF", 4, 6, 9),
            token("EFJ", 4, 7, 9),
            token("FJ", 5, 7, 10),
            token("BC", 1, 3, 11),
            token("BCD", 1, 4, 11),
            token("CD", 2, 4, 12),
            token("CDE", 2, 5, 12),
            token("DE", 3, 5, 13),
            token("DEF", 3, 6, 13),
            token("EF", 4, 6, 14),
            token("EFJ", 4, 7, 14),
            token("FJ", 5, 7, 15),
            token("BC", 1, 3, 16),
            token("BCD", 1, 4, 16),
            token("CD", 2, 4, 17),
            token("CDE", 2, 5, 17),
            token("DE", 3, 5, 18),
            token("DEF", 3, 6, 18),
            token("EF", 4, 6, 19),
            token("EFJ", 4, 7, 19),
            token("FJ", 5, 7, 20),
            token("FJH", 5, 8, 20),
            token("JH", 6, 8, 21),
            token("CD", 2, 4, 22),
            token("CDE", 2, 5, 22),
            token("DE", 3, 5, 23),
            token("DEF", 3, 6, 23),
            token("EF", 4, 6, 24),
            token("EFJ", 4, 7, 24),
            token("FJ", 5, 7, 25),
            token("FJH", 5, 8, 25),
            token("JH", 6, 8, 26),
        ];
        assert_eq!(tokens, expected);
    }

    #[test]
    fn test_norm_and_ngram_commute() {
        let expected = vec![
            token("QUI", 0, 3, 0),
            token("UIC", 1, 4, 1),
            token("ICK", 2, 5, 2),
            token("CK ", 3, 6, 3),
            token("K B", 4, 7, 4),
            token(" BR", 5, 8, 5),
            token("BRO", 6, 9, 6),
            token("ROW", 7, 10, 7),
            token("OWN", 8, 11, 8),
            token("WN ", 9, 12, 9),
            token("N F", 10, 13, 10),
            token(" FO", 11, 14, 11),
            token("FOX", 12, 15, 12),
        ];

        let mut pipeline = PipelineAnalyzer::new(vec![
            Box::new(NgramAnalyzer::new(3, 3, false).unwrap()) as Box<dyn Analyzer>,
            Box::new(NormAnalyzer::new(CaseConvert::Upper, false)),
        ])
        .unwrap();
        assert_eq!(drain(&mut pipeline, "QuIck BroWN FoX"), expected);

        let mut pipeline = PipelineAnalyzer::new(vec![
            Box::new(NormAnalyzer::new(CaseConvert::Upper, false)) as Box<dyn Analyzer>,
            Box::new(NgramAnalyzer::new(3, 3, false).unwrap()),
        ])
        .unwrap();
        assert_eq!(drain(&mut pipeline, "QuIck BroWN FoX"), expected);
    }

    #[test]
    fn test_empty_parent_values_are_skipped() {
        // The middle fields of "a,,b" yield no grams; positions still
        // advance by exactly one per surviving branch.
        let mut pipeline = PipelineAnalyzer::new(vec![
            Box::new(DelimiterAnalyzer::new(",".to_string())) as Box<dyn Analyzer>,
            Box::new(NgramAnalyzer::new(1, 1, false).unwrap()),
        ])
        .unwrap();
        let tokens = drain(&mut pipeline, "a,,b");

        assert_eq!(tokens, vec![token("a", 0, 1, 0), token("b", 3, 4, 1)]);
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut pipeline = PipelineAnalyzer::new(vec![
            Box::new(NgramAnalyzer::new(6, 7, false).unwrap()) as Box<dyn Analyzer>,
            Box::new(NgramAnalyzer::new(2, 3, false).unwrap()),
        ])
        .unwrap();
        let first = drain(&mut pipeline, "ABCDEFJH");
        let second = drain(&mut pipeline, "ABCDEFJH");
        assert_eq!(first, second);
    }
}
