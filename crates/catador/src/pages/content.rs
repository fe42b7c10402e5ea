//! Content-management page object: providers, products, manifests,
//! repositories.

use tracing::{debug, info};

use crate::config::SuiteConfig;
use crate::driver::UiDriver;
use crate::interact::{click_optional, click_or_navigate, click_required, fill_field, ClickOutcome};
use crate::locator::{Locator, LocatorTemplate};
use crate::manifest::ManifestStore;
use crate::result::{CatadorError, CatadorResult};
use crate::wait::{require_present, wait_until_present, WaitOptions};

/// Which provider section of the content tab to work in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// Organization-defined providers
    Custom,
    /// The vendor-content provider (manifest-driven)
    Vendor,
}

impl ProviderKind {
    /// Visible label of the section link
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Custom => "Custom Providers",
            Self::Vendor => "Vendor Content",
        }
    }

    /// Path of the section, used when native navigation faults
    #[must_use]
    pub const fn path(&self) -> &'static str {
        match self {
            Self::Custom => "content/providers",
            Self::Vendor => "content/providers/vendor",
        }
    }
}

/// A provider or product row located in a listing, with the numeric id the
/// application embeds in the row's DOM
#[derive(Debug, Clone)]
pub struct ProviderRow {
    /// Entity name as rendered
    pub name: String,
    /// Numeric id parsed from the row
    pub id: String,
}

struct ContentLocators {
    content_tab: Locator,
    section_link: LocatorTemplate,
    provider_row: LocatorTemplate,
    new_provider: Locator,
    provider_name: Locator,
    provider_description: Locator,
    provider_save: Locator,
    provider_remove: LocatorTemplate,
    product_row: LocatorTemplate,
    new_product: Locator,
    product_name: Locator,
    product_description: Locator,
    product_save: Locator,
    product_remove: LocatorTemplate,
    confirm_yes: Locator,
    manifest_file: Locator,
    manifest_force: Locator,
    manifest_submit: Locator,
    subscription_rows: Locator,
    repos_tab: Locator,
    repo_product: LocatorTemplate,
}

impl ContentLocators {
    fn new() -> CatadorResult<Self> {
        Ok(Self {
            content_tab: Locator::link_text("Content Management", "the Content Management tab"),
            section_link: LocatorTemplate::xpath(
                "//nav[@id='content']//a[text()='{}']",
                "the provider section link",
            )?,
            provider_row: LocatorTemplate::xpath(
                "//div[@class='provider']//span[contains(text(),'{}')]/ancestor::div[@class='provider']",
                "the provider row",
            )?,
            new_provider: Locator::xpath("//a[@id='new']", "the New Provider link"),
            provider_name: Locator::css("#provider_name", "the provider Name field"),
            provider_description: Locator::css(
                "#provider_description",
                "the provider Description field",
            ),
            provider_save: Locator::css("#provider_save", "the provider Save button"),
            provider_remove: LocatorTemplate::xpath(
                "//a[@data-provider-id='{}' and @data-action='remove']",
                "the Remove Provider link",
            )?,
            product_row: LocatorTemplate::xpath(
                "//div[@class='product']//span[contains(text(),'{}')]/ancestor::div[@class='product']",
                "the product row",
            )?,
            new_product: Locator::css("#add_product", "the Add Product button"),
            product_name: Locator::css("#product_name", "the product Name field"),
            product_description: Locator::css(
                "#product_description",
                "the product Description field",
            ),
            product_save: Locator::css("#product_save", "the product Create button"),
            product_remove: LocatorTemplate::xpath(
                "//a[@data-provider-id='{}' and @data-action='remove-product']",
                "the Remove Product link",
            )?,
            confirm_yes: Locator::xpath("//button[span[text()='Yes']]", "the Yes button"),
            manifest_file: Locator::css("#manifest_file", "the manifest upload field"),
            manifest_force: Locator::css("#force_import", "the Force checkbox"),
            manifest_submit: Locator::css("#upload_manifest", "the manifest Import button"),
            subscription_rows: Locator::xpath(
                "//table[@id='subscriptionTable']/tbody/tr",
                "an imported subscription row",
            ),
            repos_tab: Locator::link_text("Enable Repositories", "the Enable Repositories tab"),
            repo_product: LocatorTemplate::xpath(
                "//span[@class='repo-product' and text()='{}']",
                "the repository product node",
            )?,
        })
    }
}

/// Page object for the content-management tab
pub struct ContentPage {
    base_url: String,
    wait: WaitOptions,
    probe: WaitOptions,
    locators: ContentLocators,
}

impl ContentPage {
    /// Build the page object from the suite config
    pub fn new(config: &SuiteConfig) -> CatadorResult<Self> {
        Ok(Self {
            base_url: config.base_url.clone(),
            wait: config.wait.element(),
            probe: config.wait.probe(),
            locators: ContentLocators::new()?,
        })
    }

    fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Open the content-management tab
    pub async fn open_content_tab<D>(&self, driver: &mut D) -> CatadorResult<()>
    where
        D: UiDriver + ?Sized,
    {
        click_required(driver, &self.locators.content_tab, &self.wait).await
    }

    /// Open a provider section.
    ///
    /// The section links live in a hover menu; a native interaction fault
    /// here is recovered by direct navigation to the equivalent URL, and the
    /// caller sees which branch ran.
    pub async fn open_provider_section<D>(
        &self,
        driver: &mut D,
        kind: ProviderKind,
    ) -> CatadorResult<ClickOutcome>
    where
        D: UiDriver + ?Sized,
    {
        let link = self.locators.section_link.resolve(kind.label());
        click_or_navigate(driver, &link, &self.url_for(kind.path()), &self.wait).await
    }

    /// Look a provider up by name; absence is `None`
    pub async fn find_provider<D>(
        &self,
        driver: &mut D,
        name: &str,
    ) -> CatadorResult<Option<ProviderRow>>
    where
        D: UiDriver + ?Sized,
    {
        let row = self.locators.provider_row.resolve(name);
        Ok(wait_until_present(driver, &row, &self.probe)
            .await?
            .map(|element| ProviderRow {
                name: name.to_string(),
                // Row ids render as `provider_39`.
                id: element
                    .attribute("id")
                    .and_then(|id| id.rsplit('_').next())
                    .unwrap_or_default()
                    .to_string(),
            }))
    }

    async fn find_product<D>(&self, driver: &mut D, name: &str) -> CatadorResult<Option<ProviderRow>>
    where
        D: UiDriver + ?Sized,
    {
        let row = self.locators.product_row.resolve(name);
        Ok(wait_until_present(driver, &row, &self.probe)
            .await?
            .map(|element| ProviderRow {
                name: name.to_string(),
                // Product ids ride on a data URL, `/providers/39/products/13/edit`.
                id: element
                    .attribute("data-url")
                    .and_then(|url| url.split('/').nth(5))
                    .unwrap_or_default()
                    .to_string(),
            }))
    }

    /// Create a custom provider and verify it appears in the listing
    pub async fn add_custom_provider<D>(&self, driver: &mut D, name: &str) -> CatadorResult<()>
    where
        D: UiDriver + ?Sized,
    {
        self.open_content_tab(driver).await?;
        let _ = self.open_provider_section(driver, ProviderKind::Custom).await?;

        if self.find_provider(driver, name).await?.is_some() {
            return Err(CatadorError::assertion(format!(
                "provider {name:?} already exists"
            )));
        }

        click_required(driver, &self.locators.new_provider, &self.wait).await?;
        fill_field(driver, &self.locators.provider_name, name, &self.wait).await?;
        fill_field(
            driver,
            &self.locators.provider_description,
            "Created by catador.",
            &self.wait,
        )
        .await?;
        click_required(driver, &self.locators.provider_save, &self.wait).await?;

        if self.find_provider(driver, name).await?.is_none() {
            return Err(CatadorError::assertion(format!(
                "provider {name:?} did not appear after save"
            )));
        }
        info!(provider = name, "custom provider created");
        Ok(())
    }

    /// Delete a custom provider and verify it is gone
    pub async fn delete_custom_provider<D>(&self, driver: &mut D, name: &str) -> CatadorResult<()>
    where
        D: UiDriver + ?Sized,
    {
        self.open_content_tab(driver).await?;
        let _ = self.open_provider_section(driver, ProviderKind::Custom).await?;

        let row = self
            .find_provider(driver, name)
            .await?
            .ok_or_else(|| CatadorError::not_found(format!("the provider {name:?}")))?;
        driver.click(&self.locators.provider_row.resolve(name)).await?;

        let remove = self.locators.provider_remove.resolve(&row.id);
        click_required(driver, &remove, &self.wait).await?;
        click_required(driver, &self.locators.confirm_yes, &self.wait).await?;

        let _ = self.open_provider_section(driver, ProviderKind::Custom).await?;
        if self.find_provider(driver, name).await?.is_some() {
            return Err(CatadorError::assertion(format!(
                "provider {name:?} still listed after delete"
            )));
        }
        info!(provider = name, "custom provider deleted");
        Ok(())
    }

    /// Add a product under an existing custom provider
    pub async fn add_product<D>(
        &self,
        driver: &mut D,
        provider: &str,
        product: &str,
    ) -> CatadorResult<()>
    where
        D: UiDriver + ?Sized,
    {
        self.open_content_tab(driver).await?;
        let _ = self.open_provider_section(driver, ProviderKind::Custom).await?;

        let _ = self
            .find_provider(driver, provider)
            .await?
            .ok_or_else(|| CatadorError::not_found(format!("the provider {provider:?}")))?;
        driver
            .click(&self.locators.provider_row.resolve(provider))
            .await?;

        if self.find_product(driver, product).await?.is_some() {
            return Err(CatadorError::assertion(format!(
                "product {product:?} already exists"
            )));
        }

        click_required(driver, &self.locators.new_product, &self.wait).await?;
        fill_field(driver, &self.locators.product_name, product, &self.wait).await?;
        fill_field(
            driver,
            &self.locators.product_description,
            "Created by catador.",
            &self.wait,
        )
        .await?;
        click_required(driver, &self.locators.product_save, &self.wait).await?;

        if self.find_product(driver, product).await?.is_none() {
            return Err(CatadorError::assertion(format!(
                "product {product:?} did not appear after save"
            )));
        }
        info!(provider, product, "product created");
        Ok(())
    }

    /// Delete a product from a custom provider
    pub async fn delete_product<D>(
        &self,
        driver: &mut D,
        provider: &str,
        product: &str,
    ) -> CatadorResult<()>
    where
        D: UiDriver + ?Sized,
    {
        self.open_content_tab(driver).await?;
        let _ = self.open_provider_section(driver, ProviderKind::Custom).await?;

        let row = self
            .find_provider(driver, provider)
            .await?
            .ok_or_else(|| CatadorError::not_found(format!("the provider {provider:?}")))?;
        driver
            .click(&self.locators.provider_row.resolve(provider))
            .await?;

        let _ = self
            .find_product(driver, product)
            .await?
            .ok_or_else(|| CatadorError::not_found(format!("the product {product:?}")))?;
        driver
            .click(&self.locators.product_row.resolve(product))
            .await?;

        let remove = self.locators.product_remove.resolve(&row.id);
        click_required(driver, &remove, &self.wait).await?;
        click_required(driver, &self.locators.confirm_yes, &self.wait).await?;

        if self.find_product(driver, product).await?.is_some() {
            return Err(CatadorError::assertion(format!(
                "product {product:?} still listed after delete"
            )));
        }
        info!(provider, product, "product deleted");
        Ok(())
    }

    /// Upload a subscription manifest to the vendor provider and verify
    /// subscriptions appear
    pub async fn upload_manifest<D>(
        &self,
        driver: &mut D,
        store: &ManifestStore,
        manifest: &str,
        force: bool,
    ) -> CatadorResult<()>
    where
        D: UiDriver + ?Sized,
    {
        // Resolve before touching the UI so a missing manifest costs nothing.
        let path = store.resolve(manifest)?;

        self.open_content_tab(driver).await?;
        let _ = self.open_provider_section(driver, ProviderKind::Vendor).await?;

        let _ = require_present(driver, &self.locators.manifest_file, &self.wait).await?;
        debug!(path = %path.display(), "typing manifest path into the upload field");
        driver
            .type_text(&self.locators.manifest_file, &path.to_string_lossy())
            .await?;

        if force {
            // Not every server version renders the checkbox.
            let _ = click_optional(driver, &self.locators.manifest_force, &self.probe).await?;
        }

        click_required(driver, &self.locators.manifest_submit, &self.wait).await?;
        let _ = require_present(driver, &self.locators.subscription_rows, &self.wait).await?;
        info!(manifest, "manifest imported");
        Ok(())
    }

    /// Enable one repository by drilling product → version → arch → component
    pub async fn enable_repository<D>(
        &self,
        driver: &mut D,
        product: &str,
        version: &str,
        arch: &str,
        component: &str,
    ) -> CatadorResult<()>
    where
        D: UiDriver + ?Sized,
    {
        self.open_content_tab(driver).await?;
        let _ = self.open_provider_section(driver, ProviderKind::Vendor).await?;
        click_required(driver, &self.locators.repos_tab, &self.wait).await?;

        let product_node = self.locators.repo_product.resolve(product);
        let element = require_present(driver, &product_node, &self.wait).await?;
        let product_id = element.attribute("id").unwrap_or_default().to_string();
        driver.click(&product_node).await?;

        let version_node = repo_level(&product_id, &[version], "the repository version node");
        let _ = require_present(driver, &version_node, &self.wait).await?;
        driver.click(&version_node).await?;

        let arch_node = repo_level(&product_id, &[version, arch], "the repository arch node");
        let _ = require_present(driver, &arch_node, &self.wait).await?;
        driver.click(&arch_node).await?;

        let component_node = repo_level(
            &product_id,
            &[version, arch, component],
            "the repository component node",
        );
        let _ = require_present(driver, &component_node, &self.wait).await?;
        driver.click(&component_node).await?;

        info!(product, version, arch, component, "repository enabled");
        Ok(())
    }
}

/// Locator for one level of the repository tree. Each level is addressed by
/// the product node's DOM id plus the path of labels down from it, so these
/// compose rather than interpolate a single slot.
fn repo_level(product_id: &str, path: &[&str], description: &str) -> Locator {
    let mut expression = format!("//div[@id='{product_id}']");
    for label in path {
        expression.push_str(&format!("//span[text()='{label}']"));
    }
    Locator::xpath(expression, format!("{description} ({})", path.join("/")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{ElementHandle, MockDriver};

    fn page() -> ContentPage {
        let mut config = SuiteConfig {
            base_url: "https://server.example".to_string(),
            ..SuiteConfig::default()
        };
        // Single-shot probes keep scripted lookup sequences aligned with
        // the flow's find calls.
        config.wait.probe_ms = 0;
        config.wait.element_ms = 1_000;
        config.wait.poll_ms = 100;
        ContentPage::new(&config).unwrap()
    }

    /// Install the chrome every flow passes through.
    fn install_shell(mock: &mut MockDriver, page: &ContentPage) {
        mock.install_default(&page.locators.content_tab);
        mock.install_default(&page.locators.section_link.resolve(ProviderKind::Custom.label()));
        mock.install_default(&page.locators.section_link.resolve(ProviderKind::Vendor.label()));
    }

    fn provider_row(page: &ContentPage, name: &str, id: &str) -> (Locator, ElementHandle) {
        let locator = page.locators.provider_row.resolve(name);
        let element = ElementHandle::new("row", "div").with_attribute("id", format!("provider_{id}"));
        (locator, element)
    }

    #[tokio::test(start_paused = true)]
    async fn add_custom_provider_fills_and_verifies() {
        let page = page();
        let mut mock = MockDriver::new();
        install_shell(&mut mock, &page);
        mock.install_default(&page.locators.new_provider);
        mock.install_default(&page.locators.provider_name);
        mock.install_default(&page.locators.provider_description);
        mock.install_default(&page.locators.provider_save);
        // Absent before save, present after.
        let (row_locator, row) = provider_row(&page, "acme", "39");
        mock.script_find(&row_locator, vec![None, Some(row)]);

        page.add_custom_provider(&mut mock, "acme").await.unwrap();
        assert!(mock.was_called("type:css:#provider_name:acme"));
        assert!(mock.was_called("click:css:#provider_save"));
    }

    #[tokio::test(start_paused = true)]
    async fn add_custom_provider_rejects_duplicates() {
        let page = page();
        let mut mock = MockDriver::new();
        install_shell(&mut mock, &page);
        let (row_locator, row) = provider_row(&page, "acme", "39");
        mock.install(&row_locator, row);

        let err = page.add_custom_provider(&mut mock, "acme").await.unwrap_err();
        assert!(matches!(err, CatadorError::Assertion { .. }));
        assert!(!mock.was_called("click:xpath://a[@id='new']"));
    }

    #[tokio::test(start_paused = true)]
    async fn delete_missing_provider_is_not_found_with_no_interaction() {
        let page = page();
        let mut mock = MockDriver::new();
        install_shell(&mut mock, &page);

        let err = page
            .delete_custom_provider(&mut mock, "ghost")
            .await
            .unwrap_err();
        assert!(matches!(err, CatadorError::ElementNotFound { .. }));
        // The shell was traversed, but nothing provider-specific was touched.
        assert!(!mock.was_called("click:xpath://div[@class='provider']"));
        assert!(!mock.was_called("click:xpath://button"));
    }

    #[tokio::test(start_paused = true)]
    async fn find_provider_parses_the_row_id() {
        let page = page();
        let mut mock = MockDriver::new();
        let (row_locator, row) = provider_row(&page, "acme", "39");
        mock.install(&row_locator, row);

        let found = page.find_provider(&mut mock, "acme").await.unwrap().unwrap();
        assert_eq!(found.id, "39");
    }

    #[tokio::test(start_paused = true)]
    async fn upload_manifest_resolves_before_driving_the_ui() {
        let page = page();
        let mut mock = MockDriver::new();
        let dir = tempfile::tempdir().unwrap();
        let store = ManifestStore::new(dir.path());

        let err = page
            .upload_manifest(&mut mock, &store, "ghost", false)
            .await
            .unwrap_err();
        assert!(matches!(err, CatadorError::ManifestMissing { .. }));
        assert!(mock.history().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn upload_manifest_skips_absent_force_checkbox() {
        let page = page();
        let mut mock = MockDriver::new();
        install_shell(&mut mock, &page);
        mock.install_default(&page.locators.manifest_file);
        mock.install_default(&page.locators.manifest_submit);
        mock.install_default(&page.locators.subscription_rows);

        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("acme.zip"), b"pk").unwrap();
        let store = ManifestStore::new(dir.path());

        page.upload_manifest(&mut mock, &store, "acme", true)
            .await
            .unwrap();
        // Force requested but checkbox absent: typed the path, never clicked
        // a checkbox, still submitted.
        assert!(mock.was_called("type:css:#manifest_file"));
        assert!(!mock.was_called("click:css:#force_import"));
        assert!(mock.was_called("click:css:#upload_manifest"));
    }

    #[tokio::test(start_paused = true)]
    async fn enable_repository_drills_all_four_levels() {
        let page = page();
        let mut mock = MockDriver::new();
        install_shell(&mut mock, &page);
        mock.install_default(&page.locators.repos_tab);
        let product_node = page.locators.repo_product.resolve("Server OS");
        mock.install(
            &product_node,
            ElementHandle::new("p", "span").with_attribute("id", "product_7"),
        );
        mock.install_default(&repo_level("product_7", &["8"], "v"));
        mock.install_default(&repo_level("product_7", &["8", "x86_64"], "a"));
        mock.install_default(&repo_level("product_7", &["8", "x86_64", "baseos"], "c"));

        page.enable_repository(&mut mock, "Server OS", "8", "x86_64", "baseos")
            .await
            .unwrap();
        assert_eq!(mock.call_count("click:xpath://div[@id='product_7']"), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn section_fallback_navigates_to_the_equivalent_url() {
        let page = page();
        let mut mock = MockDriver::new();
        let link = page.locators.section_link.resolve(ProviderKind::Custom.label());
        mock.install_default(&link);
        mock.fail_clicks(&link, 1);

        let outcome = page
            .open_provider_section(&mut mock, ProviderKind::Custom)
            .await
            .unwrap();
        assert_eq!(
            outcome,
            ClickOutcome::FallbackNavigated {
                url: "https://server.example/content/providers".to_string()
            }
        );
    }
}
