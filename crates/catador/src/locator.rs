//! Locators: how the suite names UI elements.
//!
//! A [`Locator`] pairs a query strategy with an expression and a
//! human-readable description used in failure messages. Element names are
//! fixed at page-object construction time; the only runtime variation is a
//! single interpolation slot in a [`LocatorTemplate`] (dynamic table rows,
//! per-entity checkboxes and radios).

use serde::{Deserialize, Serialize};

use crate::result::{CatadorError, CatadorResult};

/// Query strategy for finding a UI element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strategy {
    /// CSS selector (e.g. `button.primary`)
    Css,
    /// XPath query
    XPath,
    /// `data-testid` attribute value
    TestId,
    /// Anchor text content
    LinkText,
}

impl Strategy {
    /// Short name used in log lines and error messages
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Css => "css",
            Self::XPath => "xpath",
            Self::TestId => "test-id",
            Self::LinkText => "link-text",
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A (strategy, expression) pair identifying a UI element.
///
/// Immutable once built. The `description` is what failure messages show,
/// so it names the element in product terms ("the provider Save button"),
/// not in query terms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Locator {
    strategy: Strategy,
    expression: String,
    description: String,
}

impl Locator {
    /// Create a locator with an explicit strategy
    #[must_use]
    pub fn new(
        strategy: Strategy,
        expression: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            strategy,
            expression: expression.into(),
            description: description.into(),
        }
    }

    /// Create a CSS locator
    #[must_use]
    pub fn css(expression: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(Strategy::Css, expression, description)
    }

    /// Create an XPath locator
    #[must_use]
    pub fn xpath(expression: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(Strategy::XPath, expression, description)
    }

    /// Create a `data-testid` locator
    #[must_use]
    pub fn test_id(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(Strategy::TestId, id, description)
    }

    /// Create a link-text locator
    #[must_use]
    pub fn link_text(text: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(Strategy::LinkText, text, description)
    }

    /// The query strategy
    #[must_use]
    pub const fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// The query expression
    #[must_use]
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Human-readable element name for failure messages
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Key used by drivers to identify the query (strategy-qualified)
    #[must_use]
    pub fn query_key(&self) -> String {
        format!("{}:{}", self.strategy.as_str(), self.expression)
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{}={}]", self.description, self.strategy, self.expression)
    }
}

/// A locator expression with exactly one `{}` interpolation slot.
///
/// Covers the places where the element name depends on runtime data: a
/// checkbox keyed by a MAC address, a subscription row keyed by its name, a
/// radio keyed by a UUID. Validated at construction so a missing or doubled
/// slot fails when the page object is built, not mid-flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocatorTemplate {
    strategy: Strategy,
    template: String,
    description: String,
}

impl LocatorTemplate {
    /// Create a template, validating that it has exactly one `{}` slot
    pub fn new(
        strategy: Strategy,
        template: impl Into<String>,
        description: impl Into<String>,
    ) -> CatadorResult<Self> {
        let template = template.into();
        let slots = template.matches("{}").count();
        if slots != 1 {
            return Err(CatadorError::Template {
                message: format!("expected exactly one {{}} slot, found {slots} in {template:?}"),
            });
        }
        Ok(Self {
            strategy,
            template,
            description: description.into(),
        })
    }

    /// Create an XPath template
    pub fn xpath(
        template: impl Into<String>,
        description: impl Into<String>,
    ) -> CatadorResult<Self> {
        Self::new(Strategy::XPath, template, description)
    }

    /// Create a CSS template
    pub fn css(template: impl Into<String>, description: impl Into<String>) -> CatadorResult<Self> {
        Self::new(Strategy::Css, template, description)
    }

    /// Interpolate a runtime value into the slot.
    ///
    /// An empty value is allowed and interpolates as the empty string, the
    /// same way the UI renders unnamed entities.
    #[must_use]
    pub fn resolve(&self, value: &str) -> Locator {
        Locator::new(
            self.strategy,
            self.template.replacen("{}", value, 1),
            format!("{} ({value})", self.description),
        )
    }

    /// The raw template expression
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod locator_tests {
        use super::*;

        #[test]
        fn query_key_is_strategy_qualified() {
            let loc = Locator::css("#save", "the Save button");
            assert_eq!(loc.query_key(), "css:#save");
        }

        #[test]
        fn display_leads_with_description() {
            let loc = Locator::xpath("//a[@id='new']", "the New Provider link");
            let rendered = loc.to_string();
            assert!(rendered.starts_with("the New Provider link"));
            assert!(rendered.contains("xpath"));
        }

        #[test]
        fn same_expression_different_strategy_differ() {
            let a = Locator::css("name", "a");
            let b = Locator::test_id("name", "a");
            assert_ne!(a.query_key(), b.query_key());
        }
    }

    mod template_tests {
        use super::*;

        #[test]
        fn resolve_interpolates_the_slot() {
            let tpl = LocatorTemplate::xpath(
                "//input[@value='{}']",
                "hypervisor checkbox",
            )
            .unwrap();
            let loc = tpl.resolve("52:54:00:aa:bb:cc");
            assert_eq!(loc.expression(), "//input[@value='52:54:00:aa:bb:cc']");
            assert_eq!(loc.strategy(), Strategy::XPath);
        }

        #[test]
        fn resolve_allows_empty_value() {
            let tpl = LocatorTemplate::xpath("//span[text()='{}']", "row by title").unwrap();
            assert_eq!(tpl.resolve("").expression(), "//span[text()='']");
        }

        #[test]
        fn zero_slots_rejected() {
            let err = LocatorTemplate::xpath("//a[@id='new']", "no slot").unwrap_err();
            assert!(matches!(err, CatadorError::Template { .. }));
        }

        #[test]
        fn two_slots_rejected() {
            assert!(LocatorTemplate::xpath("//a[{}]/b[{}]", "two slots").is_err());
        }

        #[test]
        fn resolved_description_names_the_value() {
            let tpl = LocatorTemplate::xpath("//span[text()='{}']", "subscription checkbox")
                .unwrap();
            assert!(tpl.resolve("Premium").description().contains("Premium"));
        }
    }
}
