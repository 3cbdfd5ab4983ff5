//! Refine loop outcome.

use super::CodeBlock;

/// What a refine loop reports when verification passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopOutcome {
    /// Iteration (1-based) whose code passed verification
    pub attempts: u32,
    /// Total calls made to the generation backend
    pub generations: u32,
    /// The code that passed, as persisted to the output path
    pub code: CodeBlock,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loop_outcome_equality() {
        let a = LoopOutcome {
            attempts: 2,
            generations: 2,
            code: CodeBlock::new("rust", "fn main() {}"),
        };
        assert_eq!(a.clone(), a);
        assert_ne!(
            a,
            LoopOutcome {
                attempts: 1,
                ..a.clone()
            }
        );
    }
}
