//! Step: the leaf instruction of a procedure

use crate::definition::{DetailedStep, StepDefinition};
use crate::timing::TimeSpan;

/// A single instruction with an expected duration
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Step {
    /// Instruction text
    pub text: String,
    /// Optional heading
    pub title: Option<String>,
    /// Expected duration; zero when unspecified
    pub duration: TimeSpan,
    pub warnings: Vec<String>,
    pub cautions: Vec<String>,
    pub notes: Vec<String>,
    pub checkboxes: Vec<String>,
}

impl Step {
    /// Create step with text only
    #[inline]
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// With duration
    #[inline]
    #[must_use]
    pub fn with_duration(mut self, duration: TimeSpan) -> Self {
        self.duration = duration;
        self
    }

    /// With title
    #[inline]
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// With one more warning
    #[inline]
    #[must_use]
    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    /// Whether anything beyond the text is set
    #[must_use]
    pub fn has_details(&self) -> bool {
        self.title.is_some()
            || !self.duration.is_zero()
            || !self.warnings.is_empty()
            || !self.cautions.is_empty()
            || !self.notes.is_empty()
            || !self.checkboxes.is_empty()
    }

    /// Build from stored form
    #[must_use]
    pub fn from_definition(definition: &StepDefinition) -> Self {
        match definition {
            StepDefinition::Text(text) => Self::new(text.clone()),
            StepDefinition::Detailed(detailed) => Self {
                text: detailed.step.clone(),
                title: detailed.title.clone(),
                duration: detailed.duration,
                warnings: detailed.warning.clone(),
                cautions: detailed.caution.clone(),
                notes: detailed.note.clone(),
                checkboxes: detailed.checkboxes.clone(),
            },
        }
    }

    /// Stored form; bare text when there are no details
    #[must_use]
    pub fn definition(&self) -> StepDefinition {
        if !self.has_details() {
            return StepDefinition::Text(self.text.clone());
        }
        StepDefinition::Detailed(DetailedStep {
            step: self.text.clone(),
            title: self.title.clone(),
            duration: self.duration,
            warning: self.warnings.clone(),
            caution: self.cautions.clone(),
            note: self.notes.clone(),
            checkboxes: self.checkboxes.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_step_stores_as_text() {
        let step = Step::new("Open hatch");
        assert_eq!(step.definition(), StepDefinition::Text("Open hatch".to_string()));
    }

    #[test]
    fn detailed_step_keeps_details() {
        let step = Step::new("Open hatch")
            .with_duration(TimeSpan::from_minutes(2))
            .with_warning("Pressure");
        let StepDefinition::Detailed(detailed) = step.definition() else {
            panic!("expected detailed form");
        };
        assert_eq!(detailed.duration, TimeSpan::from_minutes(2));
        assert_eq!(Step::from_definition(&StepDefinition::Detailed(detailed)), step);
    }
}
