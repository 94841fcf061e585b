// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Structured payload validation results.

use std::fmt;

/// A single failed validation rule.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationIssue {
    /// Name of the offending field (e.g. `"damage.amount"`).
    pub field: &'static str,
    /// Human-readable description of the failure.
    pub message: String,
}

/// Accumulates every failed rule of a payload instead of stopping at the first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    context: String,
    issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Creates an empty report for the given context (usually the event tag).
    pub fn new(context: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            issues: Vec::new(),
        }
    }

    /// Records a failed rule.
    pub fn add_issue(&mut self, field: &'static str, message: impl Into<String>) {
        self.issues.push(ValidationIssue {
            field,
            message: message.into(),
        });
    }

    /// Records a failed rule when `condition` is false.
    pub fn require(&mut self, condition: bool, field: &'static str, message: impl Into<String>) {
        if !condition {
            self.add_issue(field, message);
        }
    }

    /// Returns `true` if no rule failed.
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    /// Returns the failed rules in the order they were checked.
    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    /// Returns `true` if the given field has at least one issue.
    pub fn has_issue_for(&self, field: &str) -> bool {
        self.issues.iter().any(|issue| issue.field == field)
    }

    /// Returns the context the report was created with.
    pub fn context(&self) -> &str {
        &self.context
    }

    /// Converts the report into a `Result`, keeping it as the error when invalid.
    pub fn into_result(self) -> Result<(), ValidationReport> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Validation of '{}' failed with {} issue(s)",
            self.context,
            self.issues.len()
        )?;
        for issue in &self.issues {
            write!(f, "\n  - {}: {}", issue.field, issue.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationReport {}
