//! Property expression nodes
//!
//! Properties are resolved externally through the `Evaluator` interface
//! rather than computed from operands. The concept family identifies a fact
//! within its group by concept; the dimension family reads dimensional
//! context; the period and context families read grouping/timing metadata.

use factql_types::{PeriodFormats, Value};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An externally-resolved property of a fact or its context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Property {
    /// Opaque concept reference (evaluator-defined encoding)
    Concept(ConceptRef),
    /// Canonical concept identifier
    ConceptName(ConceptRef),
    /// Human concept label for a role
    ConceptLabel(ConceptRef),
    /// Typed value of the fact for a concept, with an optional default
    ConceptValue {
        concept: ConceptRef,
        default: Option<Value>,
    },
    /// Member reference on one dimensional axis
    DimMember(DimRef),
    /// Member identifier on one axis (explicit members only)
    DimMemberName(DimRef),
    /// Member label on one axis
    DimMemberLabel(DimRef),
    /// Member identifier for explicit members, typed value otherwise
    DimMemberValue(DimRef),
    /// The set of axis identifiers present on the fact's context
    DimAxes,
    /// Period as a value: instant datetime, `[start, end]` list, or the
    /// given fallback for unbounded periods
    Period { forever: Option<Value> },
    /// Period formatted as text
    PeriodStr(PeriodFormats),
    /// Period start datetime
    StartDateTime,
    /// Period end datetime
    EndDateTime,
    /// Inclusive period end date
    EndDate,
    /// Fiscal year of the period end
    FiscalYear,
    /// Context identifier; the default primary grouping key
    ContextId,
    /// Context hash that ignores period-type classification
    ContextHash,
}

/// Concept identity carried by concept-family properties.
///
/// `name` may be `None` when the property is resolved from a fact alone.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConceptRef {
    pub name: Option<String>,
    pub label_role: Option<String>,
}

impl ConceptRef {
    /// Create a reference to a named concept
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            label_role: None,
        }
    }

    /// Set the label role used for display
    pub fn with_label_role(mut self, role: impl Into<String>) -> Self {
        self.label_role = Some(role.into());
        self
    }
}

/// Axis identity carried by dimension-member properties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimRef {
    pub axis: String,
    /// Fall back to the axis's declared default member when the fact's
    /// context does not mention the axis
    pub include_defaults: bool,
    pub label_role: Option<String>,
}

impl DimRef {
    /// Create a reference to an axis, with default-member fallback enabled
    pub fn new(axis: impl Into<String>) -> Self {
        Self {
            axis: axis.into(),
            include_defaults: true,
            label_role: None,
        }
    }

    /// Disable default-member fallback
    pub fn without_defaults(mut self) -> Self {
        self.include_defaults = false;
        self
    }

    /// Set the label role used for display
    pub fn with_label_role(mut self, role: impl Into<String>) -> Self {
        self.label_role = Some(role.into());
        self
    }
}

impl Property {
    /// The concept identifier this property references, if any
    pub fn concept_name(&self) -> Option<&str> {
        match self {
            Self::Concept(c) | Self::ConceptName(c) | Self::ConceptLabel(c) => c.name.as_deref(),
            Self::ConceptValue { concept, .. } => concept.name.as_deref(),
            _ => None,
        }
    }

    /// The concept reference of a concept-family property
    pub fn concept_ref(&self) -> Option<&ConceptRef> {
        match self {
            Self::Concept(c) | Self::ConceptName(c) | Self::ConceptLabel(c) => Some(c),
            Self::ConceptValue { concept, .. } => Some(concept),
            _ => None,
        }
    }

    /// The axis reference of a dimension-member property
    pub fn dim_ref(&self) -> Option<&DimRef> {
        match self {
            Self::DimMember(d)
            | Self::DimMemberName(d)
            | Self::DimMemberLabel(d)
            | Self::DimMemberValue(d) => Some(d),
            _ => None,
        }
    }

    /// Check if this property reads dimensional context
    pub fn is_dimensional(&self) -> bool {
        matches!(
            self,
            Self::DimMember(_)
                | Self::DimMemberName(_)
                | Self::DimMemberLabel(_)
                | Self::DimMemberValue(_)
                | Self::DimAxes
        )
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let named = |f: &mut fmt::Formatter<'_>, kind: &str, name: Option<&str>| match name {
            Some(name) => write!(f, "{kind}({name})"),
            None => write!(f, "{kind}()"),
        };
        match self {
            Self::Concept(c) => named(f, "Concept", c.name.as_deref()),
            Self::ConceptName(c) => named(f, "ConceptName", c.name.as_deref()),
            Self::ConceptLabel(c) => named(f, "ConceptLabel", c.name.as_deref()),
            Self::ConceptValue { concept, .. } => {
                named(f, "ConceptValue", concept.name.as_deref())
            }
            Self::DimMember(d) => write!(f, "DimMember({})", d.axis),
            Self::DimMemberName(d) => write!(f, "DimMemberName({})", d.axis),
            Self::DimMemberLabel(d) => write!(f, "DimMemberLabel({})", d.axis),
            Self::DimMemberValue(d) => write!(f, "DimMemberValue({})", d.axis),
            Self::DimAxes => write!(f, "DimAxes()"),
            Self::Period { .. } => write!(f, "Period()"),
            Self::PeriodStr(_) => write!(f, "PeriodStr()"),
            Self::StartDateTime => write!(f, "StartDateTime()"),
            Self::EndDateTime => write!(f, "EndDateTime()"),
            Self::EndDate => write!(f, "EndDate()"),
            Self::FiscalYear => write!(f, "FY()"),
            Self::ContextId => write!(f, "ContextId()"),
            Self::ContextHash => write!(f, "ContextHash()"),
        }
    }
}
