//! Recovering a source line from a fault.
//!
//! Engines disagree on where the line lives: a `line` field, a
//! `lineNumber` field, or only inside the stack text. Extractors are tried
//! in order and the first hit wins.

use regex::Regex;

use super::evaluator::Fault;

pub trait LineExtractor: Send + Sync {
    fn extract_line(&self, fault: &Fault) -> Option<u32>;
}

/// `fault.line`
pub struct LineField;

impl LineExtractor for LineField {
    fn extract_line(&self, fault: &Fault) -> Option<u32> {
        fault.line
    }
}

/// `fault.lineNumber`
pub struct LineNumberField;

impl LineExtractor for LineNumberField {
    fn extract_line(&self, fault: &Fault) -> Option<u32> {
        fault.line_number
    }
}

/// First capture of a pattern matched against the stack text.
pub struct StackTrace {
    pattern: Regex,
}

impl StackTrace {
    pub fn new(pattern: Regex) -> Self {
        Self { pattern }
    }

    /// `eval`-style frames: `at <anonymous>:12:5`
    pub fn anonymous() -> Self {
        Self::new(Regex::new(r"<anonymous>:(\d+)").unwrap())
    }

    /// Script piped to an engine on stdin: `at [stdin]:12:5`
    pub fn stdin() -> Self {
        Self::new(Regex::new(r"\[stdin\]:(\d+)").unwrap())
    }
}

impl LineExtractor for StackTrace {
    fn extract_line(&self, fault: &Fault) -> Option<u32> {
        let stack = fault.stack.as_deref()?;
        self.pattern
            .captures(stack)
            .and_then(|c| c[1].parse().ok())
    }
}

/// Ordered extractor chain.
pub struct LineExtractors {
    chain: Vec<Box<dyn LineExtractor>>,
}

impl LineExtractors {
    pub fn new(chain: Vec<Box<dyn LineExtractor>>) -> Self {
        Self { chain }
    }

    /// Raw line in wrapped-unit coordinates.
    pub fn extract(&self, fault: &Fault) -> Option<u32> {
        self.chain.iter().find_map(|e| e.extract_line(fault))
    }

    /// Line in user-code coordinates. Lines inside the prologue have no
    /// user-code counterpart and yield `None`.
    pub fn extract_user_line(&self, fault: &Fault, prologue_lines: u32) -> Option<u32> {
        self.extract(fault)?
            .checked_sub(prologue_lines)
            .filter(|line| *line > 0)
    }
}

impl Default for LineExtractors {
    fn default() -> Self {
        Self::new(vec![
            Box::new(LineField),
            Box::new(LineNumberField),
            Box::new(StackTrace::anonymous()),
            Box::new(StackTrace::stdin()),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fault_with_stack(stack: &str) -> Fault {
        Fault::new("Error", "boom").with_stack(stack)
    }

    #[test]
    fn test_field_order() {
        let mut fault = fault_with_stack("at <anonymous>:40:1");
        fault.line = Some(10);
        fault.line_number = Some(20);
        assert_eq!(LineExtractors::default().extract(&fault), Some(10));

        fault.line = None;
        assert_eq!(LineExtractors::default().extract(&fault), Some(20));

        fault.line_number = None;
        assert_eq!(LineExtractors::default().extract(&fault), Some(40));
    }

    #[test]
    fn test_stdin_stack() {
        let fault = fault_with_stack("Error: boom\n    at App ([stdin]:57:11)\n    at [stdin]:80:3");
        assert_eq!(LineExtractors::default().extract(&fault), Some(57));
    }

    #[test]
    fn test_no_line() {
        let fault = fault_with_stack("Error: boom\n    at native code");
        assert_eq!(LineExtractors::default().extract(&fault), None);
        assert_eq!(LineExtractors::default().extract(&Fault::new("E", "m")), None);
    }

    #[test]
    fn test_user_line_subtracts_prologue() {
        let mut fault = Fault::new("Error", "boom");
        fault.line = Some(53);
        let chain = LineExtractors::default();
        assert_eq!(chain.extract_user_line(&fault, 50), Some(3));

        fault.line = Some(12);
        assert_eq!(chain.extract_user_line(&fault, 50), None);

        fault.line = Some(50);
        assert_eq!(chain.extract_user_line(&fault, 50), None);
    }

    #[test]
    fn test_custom_chain() {
        let chain = LineExtractors::new(vec![Box::new(StackTrace::new(
            Regex::new(r"@line (\d+)").unwrap(),
        ))]);
        assert_eq!(chain.extract(&fault_with_stack("x @line 9")), Some(9));
    }
}
