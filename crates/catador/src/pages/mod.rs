//! Page objects for the application under test.
//!
//! Each page object owns a typed struct of named locators built once at
//! construction, and exposes operations in product terms. Page objects hold
//! no driver; every operation borrows the session it runs against.

mod content;
mod deployment;

pub use content::{ContentPage, ProviderKind, ProviderRow};
pub use deployment::{
    CloudSection, DeploymentPlan, DeploymentProduct, DeploymentWizard, DomainSpec,
    LifecycleSection, MgmtEngineSection, NodeSpec, ServerSection, StorageSection,
    SubscriptionSection, VirtSection,
};
