//! Typed field addresses
//!
//! Text form: `SEG[occurrence]-field(repetition).component.subcomponent`,
//! where everything but the segment name and field number is optional and
//! defaults to 1. Examples: `PID-5.1`, `OBX[2]-5`, `PID-3(2).1`, `OBR-4.1.2`.

use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

fn locator_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^([A-Z][A-Z0-9]{2})(?:\[(\d+)\])?-(\d+)(?:\((\d+)\))?(?:\.(\d+)(?:\.(\d+))?)?$",
        )
        .expect("locator pattern compiles")
    })
}

/// Address of one value in a message
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locator {
    segment: String,
    occurrence: usize,
    field: usize,
    repetition: usize,
    component: Option<usize>,
    subcomponent: Option<usize>,
}

impl Locator {
    /// First occurrence of `segment`, field `field`
    pub fn new(segment: impl Into<String>, field: usize) -> Self {
        Self {
            segment: segment.into(),
            occurrence: 1,
            field,
            repetition: 1,
            component: None,
            subcomponent: None,
        }
    }

    pub fn occurrence(&self) -> usize {
        self.occurrence
    }

    pub fn segment(&self) -> &str {
        &self.segment
    }

    pub fn field(&self) -> usize {
        self.field
    }

    pub fn repetition(&self) -> usize {
        self.repetition
    }

    pub fn component(&self) -> usize {
        self.component.unwrap_or(1)
    }

    pub fn subcomponent(&self) -> usize {
        self.subcomponent.unwrap_or(1)
    }

    pub fn at_occurrence(mut self, occurrence: usize) -> Self {
        self.occurrence = occurrence;
        self
    }

    pub fn at_repetition(mut self, repetition: usize) -> Self {
        self.repetition = repetition;
        self
    }

    pub fn at_component(mut self, component: usize) -> Self {
        self.component = Some(component);
        self
    }

    pub fn at_subcomponent(mut self, subcomponent: usize) -> Self {
        if self.component.is_none() {
            self.component = Some(1);
        }
        self.subcomponent = Some(subcomponent);
        self
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segment)?;
        if self.occurrence != 1 {
            write!(f, "[{}]", self.occurrence)?;
        }
        write!(f, "-{}", self.field)?;
        if self.repetition != 1 {
            write!(f, "({})", self.repetition)?;
        }
        if let Some(c) = self.component {
            write!(f, ".{c}")?;
        }
        if let Some(s) = self.subcomponent {
            write!(f, ".{s}")?;
        }
        Ok(())
    }
}

impl FromStr for Locator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = locator_regex().captures(s.trim()).ok_or_else(|| {
            format!("Invalid locator '{s}'. Expected e.g. PID-5.1, OBX[2]-5 or PID-3(2).1")
        })?;

        let number = |i: usize| -> Result<Option<usize>, String> {
            match caps.get(i) {
                None => Ok(None),
                Some(m) => match m.as_str().parse::<usize>() {
                    Ok(0) => Err(format!("Invalid locator '{s}': positions are 1-based")),
                    Ok(n) => Ok(Some(n)),
                    Err(e) => Err(format!("Invalid locator '{s}': {e}")),
                },
            }
        };

        Ok(Self {
            segment: caps[1].to_string(),
            occurrence: number(2)?.unwrap_or(1),
            field: number(3)?.unwrap_or(1),
            repetition: number(4)?.unwrap_or(1),
            component: number(5)?,
            subcomponent: number(6)?,
        })
    }
}
