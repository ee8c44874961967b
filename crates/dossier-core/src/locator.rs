use std::fmt;

/// How a [`Locator`] value is interpreted by the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocatorKind {
    Css,
    XPath,
    Id,
}

/// A locator type + value pair resolved against the current page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locator {
    pub kind: LocatorKind,
    pub value: String,
}

impl Locator {
    pub fn css(value: impl Into<String>) -> Self {
        Self {
            kind: LocatorKind::Css,
            value: value.into(),
        }
    }

    pub fn xpath(value: impl Into<String>) -> Self {
        Self {
            kind: LocatorKind::XPath,
            value: value.into(),
        }
    }

    pub fn id(value: impl Into<String>) -> Self {
        Self {
            kind: LocatorKind::Id,
            value: value.into(),
        }
    }

    /// The locator expressed as a CSS selector, when it has one.
    ///
    /// XPath locators have no CSS form and must be evaluated by the session.
    pub fn as_css(&self) -> Option<String> {
        match self.kind {
            LocatorKind::Css => Some(self.value.clone()),
            LocatorKind::Id => Some(format!("#{}", self.value)),
            LocatorKind::XPath => None,
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            LocatorKind::Css => "css",
            LocatorKind::XPath => "xpath",
            LocatorKind::Id => "id",
        };
        write!(f, "{kind}={}", self.value)
    }
}
