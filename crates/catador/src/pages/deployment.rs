//! The multi-page guided deployment wizard.
//!
//! A [`DeploymentPlan`] describes the whole deployment up front; the wizard
//! walks the pages in order, driving only the pages the plan's product
//! selection brings into play, and then hands the long-running completion
//! wait to [`crate::wizard::await_completion`].

use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::SuiteConfig;
use crate::driver::UiDriver;
use crate::interact::{click_optional, click_required, fill_field, fill_field_optional};
use crate::locator::{Locator, LocatorTemplate};
use crate::result::{CatadorError, CatadorResult};
use crate::wait::{require_clickable, wait_until_present, WaitOptions};
use crate::wizard::{await_completion, CompletionPolicy, CompletionStats};

/// How long the final submit control may take to become clickable.
/// The review page assembles the whole deployment before enabling it.
const SUBMIT_CLICKABLE_TIMEOUT_MS: u64 = 300_000;

/// How long the Next button may take to enable after node registration
const NODE_REGISTRATION_TIMEOUT_MS: u64 = 30_000;

/// Products the wizard can deploy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeploymentProduct {
    /// The virtualization manager and its hypervisors
    Virtualization,
    /// The cloud-infrastructure overcloud
    CloudInfrastructure,
    /// The management engine appliance
    ManagementEngine,
}

impl DeploymentProduct {
    /// Identifier used in the product-selection checkboxes
    #[must_use]
    pub const fn slug(&self) -> &'static str {
        match self {
            Self::Virtualization => "virtualization",
            Self::CloudInfrastructure => "cloud-infrastructure",
            Self::ManagementEngine => "management-engine",
        }
    }
}

/// Server name and description entered on the configuration page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSection {
    /// Server name
    pub name: String,
    /// Server description
    #[serde(default)]
    pub description: String,
}

/// Lifecycle-environment page inputs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleSection {
    /// Which update channel the deployment tracks
    pub update_channel: String,
    /// Optional named environment path to attach to
    #[serde(default)]
    pub environment_path: Option<String>,
}

/// One overcloud node registration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSpec {
    /// Power-management driver kind
    pub driver: String,
    /// Node management IP
    pub ip_address: String,
    /// Power-management user
    pub username: String,
    /// Power-management password
    pub password: String,
    /// MAC address of the provisioning NIC
    pub mac_address: String,
}

/// Cloud-infrastructure section: undercloud plus node registrations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudSection {
    /// Undercloud IP or hostname
    pub undercloud_address: String,
    /// Undercloud SSH user
    pub undercloud_user: String,
    /// Undercloud SSH password
    pub undercloud_password: String,
    /// Overcloud nodes to register
    #[serde(default)]
    pub nodes: Vec<NodeSpec>,
}

/// One storage domain
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainSpec {
    /// Domain name
    pub name: String,
    /// Storage server address
    pub address: String,
    /// Exported share path
    pub share_path: String,
}

/// Storage configuration for the virtualization product
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageSection {
    /// Storage backend kind as labeled in the wizard
    pub kind: String,
    /// The data domain
    pub data_domain: DomainSpec,
    /// The export domain, when the selected products need one
    #[serde(default)]
    pub export_domain: Option<DomainSpec>,
}

/// Virtualization section of a plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtSection {
    /// Setup type as labeled in the wizard
    pub setup_type: String,
    /// MAC of the host that runs the engine
    pub engine_mac: String,
    /// MACs of the hypervisor hosts
    pub hypervisor_macs: Vec<String>,
    /// Hypervisor root password
    pub root_password: String,
    /// Engine admin password
    pub admin_password: String,
    /// Optional datacenter name override
    #[serde(default)]
    pub datacenter: Option<String>,
    /// Optional cluster name override
    #[serde(default)]
    pub cluster: Option<String>,
    /// Optional CPU type override
    #[serde(default)]
    pub cpu_type: Option<String>,
    /// Storage domains
    pub storage: StorageSection,
}

/// Management-engine section of a plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MgmtEngineSection {
    /// Where the appliance installs, as labeled in the wizard
    pub install_on: String,
    /// Appliance root password
    pub root_password: String,
    /// Appliance admin password
    pub admin_password: String,
}

/// Subscription credentials and selections
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionSection {
    /// Portal account name
    pub username: String,
    /// Portal account password
    pub password: String,
    /// UUID of the management application to register against
    pub management_app_uuid: String,
    /// Subscription names to attach
    #[serde(default)]
    pub subscriptions: Vec<String>,
}

/// Everything one deployment needs, loadable from a YAML fixture
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentPlan {
    /// Products to deploy
    #[serde(default)]
    pub products: Vec<DeploymentProduct>,
    /// Server configuration page
    #[serde(default)]
    pub server: ServerSection,
    /// Lifecycle-environment page
    #[serde(default)]
    pub lifecycle: LifecycleSection,
    /// Opt in to the analytics service
    #[serde(default)]
    pub enable_analytics: bool,
    /// Cloud-infrastructure pages; present iff the product is selected
    #[serde(default)]
    pub cloud: Option<CloudSection>,
    /// Virtualization pages; present iff the product is selected
    #[serde(default)]
    pub virt: Option<VirtSection>,
    /// Management-engine pages; present iff the product is selected
    #[serde(default)]
    pub mgmt_engine: Option<MgmtEngineSection>,
    /// Subscription pages
    #[serde(default)]
    pub subscription: SubscriptionSection,
}

impl DeploymentPlan {
    /// Load a plan from a YAML file
    pub fn load(path: &Path) -> CatadorResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        let plan: Self = serde_yaml_ng::from_str(&raw)?;
        plan.validate()?;
        Ok(plan)
    }

    /// Each selected product must come with its section, and each section
    /// must be backed by its product — caught here, not ten pages in.
    pub fn validate(&self) -> CatadorResult<()> {
        let pairs = [
            (
                DeploymentProduct::CloudInfrastructure,
                self.cloud.is_some(),
                "cloud",
            ),
            (DeploymentProduct::Virtualization, self.virt.is_some(), "virt"),
            (
                DeploymentProduct::ManagementEngine,
                self.mgmt_engine.is_some(),
                "mgmt_engine",
            ),
        ];
        for (product, has_section, section) in pairs {
            let selected = self.products.contains(&product);
            if selected && !has_section {
                return Err(CatadorError::config(format!(
                    "plan selects {:?} but has no {section} section",
                    product.slug()
                )));
            }
            if !selected && has_section {
                return Err(CatadorError::config(format!(
                    "plan has a {section} section but does not select {:?}",
                    product.slug()
                )));
            }
        }
        Ok(())
    }
}

struct WizardLocators {
    next: Locator,
    submit: Locator,
    product_check: LocatorTemplate,
    select_products: Locator,
    server_name: Locator,
    server_description: Locator,
    update_channel: LocatorTemplate,
    env_path: LocatorTemplate,
    analytics_check: Locator,
    undercloud_address: Locator,
    undercloud_user: Locator,
    undercloud_password: Locator,
    detect_undercloud: Locator,
    register_nodes: Locator,
    add_node: Locator,
    node_driver_select: Locator,
    node_driver_item: LocatorTemplate,
    node_ip: Locator,
    node_user: Locator,
    node_password: Locator,
    node_mac: Locator,
    submit_nodes: Locator,
    setup_type: LocatorTemplate,
    engine_mac_radio: LocatorTemplate,
    hypervisor_mac_check: LocatorTemplate,
    virt_root_password: Locator,
    virt_root_password_confirm: Locator,
    virt_admin_password: Locator,
    virt_admin_password_confirm: Locator,
    datacenter_name: Locator,
    cluster_name: Locator,
    cpu_type: Locator,
    storage_type: LocatorTemplate,
    data_domain_name: Locator,
    data_domain_address: Locator,
    data_domain_path: Locator,
    export_domain_name: Locator,
    export_domain_address: Locator,
    export_domain_path: Locator,
    mgmt_install_on: LocatorTemplate,
    mgmt_root_password: Locator,
    mgmt_root_password_confirm: Locator,
    mgmt_admin_password: Locator,
    mgmt_admin_password_confirm: Locator,
    subscription_username: Locator,
    subscription_password: Locator,
    management_app_radio: LocatorTemplate,
    subscription_check: LocatorTemplate,
}

impl WizardLocators {
    #[allow(clippy::too_many_lines)]
    fn new() -> CatadorResult<Self> {
        Ok(Self {
            next: Locator::css("#wizard_next", "the wizard Next button"),
            submit: Locator::css("#wizard_deploy", "the Deploy button"),
            product_check: LocatorTemplate::css(
                "input[name='products'][value='{}']",
                "the product checkbox",
            )?,
            select_products: Locator::css("#select_products", "the product Select button"),
            server_name: Locator::css("#server_name", "the server Name field"),
            server_description: Locator::css(
                "#server_description",
                "the server Description field",
            ),
            update_channel: LocatorTemplate::xpath(
                "//input[@name='update_channel' and @value='{}']",
                "the update-channel radio",
            )?,
            env_path: LocatorTemplate::xpath(
                "//div[@id='environments']//label[text()='{}']",
                "the environment path",
            )?,
            analytics_check: Locator::css("#enable_analytics", "the analytics opt-in checkbox"),
            undercloud_address: Locator::css("#undercloud_ip", "the undercloud Address field"),
            undercloud_user: Locator::css("#undercloud_user", "the undercloud SSH User field"),
            undercloud_password: Locator::css(
                "#undercloud_password",
                "the undercloud SSH Password field",
            ),
            detect_undercloud: Locator::css("#detect_undercloud", "the Detect button"),
            register_nodes: Locator::css("#register_nodes", "the Register Nodes button"),
            add_node: Locator::css("#add_node", "the Add Node button"),
            node_driver_select: Locator::css("#node_driver", "the node Driver dropdown"),
            node_driver_item: LocatorTemplate::xpath(
                "//ul[@id='node_driver_menu']//a[text()='{}']",
                "the node driver entry",
            )?,
            node_ip: Locator::css("#node_ip_address", "the node IP Address field"),
            node_user: Locator::css("#node_ipmi_user", "the node power User field"),
            node_password: Locator::css("#node_ipmi_password", "the node power Password field"),
            node_mac: Locator::css("#node_nic_mac", "the node NIC MAC field"),
            submit_nodes: Locator::css("#submit_nodes", "the node registration Submit button"),
            setup_type: LocatorTemplate::xpath(
                "//input[@name='setup_type' and @value='{}']",
                "the setup-type radio",
            )?,
            engine_mac_radio: LocatorTemplate::xpath(
                "//input[@name='engine_host' and @value='{}']",
                "the engine host radio",
            )?,
            hypervisor_mac_check: LocatorTemplate::xpath(
                "//input[@name='hypervisor_hosts' and @value='{}']",
                "the hypervisor host checkbox",
            )?,
            virt_root_password: Locator::css("#virt_root_password", "the hypervisor root Password field"),
            virt_root_password_confirm: Locator::css(
                "#virt_root_password_confirm",
                "the hypervisor root password Confirm field",
            ),
            virt_admin_password: Locator::css(
                "#virt_admin_password",
                "the engine admin Password field",
            ),
            virt_admin_password_confirm: Locator::css(
                "#virt_admin_password_confirm",
                "the engine admin password Confirm field",
            ),
            datacenter_name: Locator::css("#datacenter_name", "the Datacenter Name field"),
            cluster_name: Locator::css("#cluster_name", "the Cluster Name field"),
            cpu_type: Locator::css("#cpu_type", "the CPU Type field"),
            storage_type: LocatorTemplate::xpath(
                "//input[@name='storage_type' and @value='{}']",
                "the storage-type radio",
            )?,
            data_domain_name: Locator::css("#data_domain_name", "the data domain Name field"),
            data_domain_address: Locator::css(
                "#data_domain_address",
                "the data domain Address field",
            ),
            data_domain_path: Locator::css("#data_domain_path", "the data domain Share Path field"),
            export_domain_name: Locator::css("#export_domain_name", "the export domain Name field"),
            export_domain_address: Locator::css(
                "#export_domain_address",
                "the export domain Address field",
            ),
            export_domain_path: Locator::css(
                "#export_domain_path",
                "the export domain Share Path field",
            ),
            mgmt_install_on: LocatorTemplate::xpath(
                "//input[@name='mgmt_install_on' and @value='{}']",
                "the appliance install-location radio",
            )?,
            mgmt_root_password: Locator::css(
                "#mgmt_root_password",
                "the appliance root Password field",
            ),
            mgmt_root_password_confirm: Locator::css(
                "#mgmt_root_password_confirm",
                "the appliance root password Confirm field",
            ),
            mgmt_admin_password: Locator::css(
                "#mgmt_admin_password",
                "the appliance admin Password field",
            ),
            mgmt_admin_password_confirm: Locator::css(
                "#mgmt_admin_password_confirm",
                "the appliance admin password Confirm field",
            ),
            subscription_username: Locator::css(
                "#subscription_username",
                "the portal Username field",
            ),
            subscription_password: Locator::css(
                "#subscription_password",
                "the portal Password field",
            ),
            management_app_radio: LocatorTemplate::xpath(
                "//input[@name='management_app' and @value='{}']",
                "the management application radio",
            )?,
            subscription_check: LocatorTemplate::xpath(
                "//table[@id='subscriptions']//tr[td[text()='{}']]//input",
                "the subscription checkbox",
            )?,
        })
    }
}

/// Page object for the guided deployment wizard
pub struct DeploymentWizard {
    base_url: String,
    wait: WaitOptions,
    probe: WaitOptions,
    locators: WizardLocators,
}

impl DeploymentWizard {
    /// Build the wizard from the suite config
    pub fn new(config: &SuiteConfig) -> CatadorResult<Self> {
        Ok(Self {
            base_url: config.base_url.clone(),
            wait: config.wait.element(),
            probe: config.wait.probe(),
            locators: WizardLocators::new()?,
        })
    }

    async fn next<D: UiDriver + ?Sized>(&self, driver: &mut D) -> CatadorResult<()> {
        click_required(driver, &self.locators.next, &self.wait).await
    }

    /// Walk every page the plan brings into play, stopping at the review
    /// page. Call [`Self::submit_and_await`] afterwards.
    pub async fn run<D>(&self, driver: &mut D, plan: &DeploymentPlan) -> CatadorResult<()>
    where
        D: UiDriver + ?Sized,
    {
        plan.validate()?;
        let url = format!("{}/deployments/new", self.base_url.trim_end_matches('/'));
        driver.navigate(&url).await?;

        self.page_product_selection(driver, plan).await?;
        self.page_server_configuration(driver, &plan.server).await?;
        self.page_lifecycle(driver, &plan.lifecycle).await?;
        self.page_analytics(driver, plan.enable_analytics).await?;

        if let Some(cloud) = &plan.cloud {
            self.page_discover_undercloud(driver, cloud).await?;
            self.page_register_nodes(driver, cloud).await?;
            self.page_assign_nodes(driver).await?;
        }

        if let Some(virt) = &plan.virt {
            self.page_setup_type(driver, virt).await?;
            self.page_engine_selection(driver, virt).await?;
            self.page_hypervisor_selection(driver, virt).await?;
            self.page_virt_configuration(driver, virt).await?;
            self.page_storage(driver, &virt.storage).await?;
        }

        if let Some(engine) = &plan.mgmt_engine {
            self.page_mgmt_engine(driver, engine).await?;
        }

        self.page_subscription_login(driver, &plan.subscription).await?;
        self.page_management_app(driver, &plan.subscription).await?;
        self.page_select_subscriptions(driver, &plan.subscription).await?;
        // Review Subscriptions: nothing to enter, walk through.
        self.next(driver).await?;

        info!(server = %plan.server.name, "wizard walked to the review page");
        Ok(())
    }

    async fn page_product_selection<D>(
        &self,
        driver: &mut D,
        plan: &DeploymentPlan,
    ) -> CatadorResult<()>
    where
        D: UiDriver + ?Sized,
    {
        for product in &plan.products {
            let check = self.locators.product_check.resolve(product.slug());
            click_required(driver, &check, &self.wait).await?;
        }
        click_required(driver, &self.locators.select_products, &self.wait).await
    }

    async fn page_server_configuration<D>(
        &self,
        driver: &mut D,
        server: &ServerSection,
    ) -> CatadorResult<()>
    where
        D: UiDriver + ?Sized,
    {
        if wait_until_present(driver, &self.locators.server_name, &self.probe)
            .await?
            .is_some()
        {
            fill_field(driver, &self.locators.server_name, &server.name, &self.wait).await?;
            fill_field(
                driver,
                &self.locators.server_description,
                &server.description,
                &self.wait,
            )
            .await?;
        }
        self.next(driver).await?;
        // Organization page: the deployment joins the default organization.
        // TODO: drive the new-organization form once the wizard exposes it.
        self.next(driver).await
    }

    async fn page_lifecycle<D>(
        &self,
        driver: &mut D,
        lifecycle: &LifecycleSection,
    ) -> CatadorResult<()>
    where
        D: UiDriver + ?Sized,
    {
        let channel = self.locators.update_channel.resolve(&lifecycle.update_channel);
        click_required(driver, &channel, &self.wait).await?;
        if let Some(path) = &lifecycle.environment_path {
            let env = self.locators.env_path.resolve(path);
            click_required(driver, &env, &self.wait).await?;
        }
        self.next(driver).await
    }

    async fn page_analytics<D>(&self, driver: &mut D, enable: bool) -> CatadorResult<()>
    where
        D: UiDriver + ?Sized,
    {
        if enable {
            click_required(driver, &self.locators.analytics_check, &self.wait).await?;
        }
        self.next(driver).await
    }

    async fn page_discover_undercloud<D>(
        &self,
        driver: &mut D,
        cloud: &CloudSection,
    ) -> CatadorResult<()>
    where
        D: UiDriver + ?Sized,
    {
        fill_field(
            driver,
            &self.locators.undercloud_address,
            &cloud.undercloud_address,
            &self.wait,
        )
        .await?;
        fill_field(
            driver,
            &self.locators.undercloud_user,
            &cloud.undercloud_user,
            &self.wait,
        )
        .await?;
        fill_field(
            driver,
            &self.locators.undercloud_password,
            &cloud.undercloud_password,
            &self.wait,
        )
        .await?;
        click_required(driver, &self.locators.detect_undercloud, &self.wait).await?;
        self.next(driver).await
    }

    async fn page_register_nodes<D>(
        &self,
        driver: &mut D,
        cloud: &CloudSection,
    ) -> CatadorResult<()>
    where
        D: UiDriver + ?Sized,
    {
        click_required(driver, &self.locators.register_nodes, &self.wait).await?;
        for (index, node) in cloud.nodes.iter().enumerate() {
            if index > 0 {
                click_required(driver, &self.locators.add_node, &self.wait).await?;
            }
            click_required(driver, &self.locators.node_driver_select, &self.wait).await?;
            let item = self.locators.node_driver_item.resolve(&node.driver);
            click_required(driver, &item, &self.wait).await?;
            fill_field(driver, &self.locators.node_ip, &node.ip_address, &self.wait).await?;
            fill_field(driver, &self.locators.node_user, &node.username, &self.wait).await?;
            fill_field(driver, &self.locators.node_password, &node.password, &self.wait).await?;
            fill_field(driver, &self.locators.node_mac, &node.mac_address, &self.wait).await?;
        }
        click_required(driver, &self.locators.submit_nodes, &self.wait).await?;
        // Registration grinds for a while before Next enables.
        let slow = WaitOptions::new()
            .with_timeout(NODE_REGISTRATION_TIMEOUT_MS)
            .with_poll_interval(self.wait.poll_interval_ms);
        let _ = require_clickable(driver, &self.locators.next, &slow).await?;
        driver.click(&self.locators.next).await
    }

    async fn page_assign_nodes<D>(&self, driver: &mut D) -> CatadorResult<()>
    where
        D: UiDriver + ?Sized,
    {
        // Role assignment picks sane defaults once nodes are registered.
        self.next(driver).await
    }

    async fn page_setup_type<D>(&self, driver: &mut D, virt: &VirtSection) -> CatadorResult<()>
    where
        D: UiDriver + ?Sized,
    {
        let radio = self.locators.setup_type.resolve(&virt.setup_type);
        if wait_until_present(driver, &radio, &self.probe).await?.is_some() {
            driver.click(&radio).await?;
        } else {
            warn!(setup_type = %virt.setup_type, "setup-type radio not rendered, keeping the default");
        }
        self.next(driver).await
    }

    async fn page_engine_selection<D>(&self, driver: &mut D, virt: &VirtSection) -> CatadorResult<()>
    where
        D: UiDriver + ?Sized,
    {
        let radio = self.locators.engine_mac_radio.resolve(&virt.engine_mac);
        click_required(driver, &radio, &self.wait).await?;
        self.next(driver).await
    }

    async fn page_hypervisor_selection<D>(
        &self,
        driver: &mut D,
        virt: &VirtSection,
    ) -> CatadorResult<()>
    where
        D: UiDriver + ?Sized,
    {
        for mac in &virt.hypervisor_macs {
            let check = self.locators.hypervisor_mac_check.resolve(mac);
            click_required(driver, &check, &self.wait).await?;
        }
        self.next(driver).await
    }

    async fn page_virt_configuration<D>(
        &self,
        driver: &mut D,
        virt: &VirtSection,
    ) -> CatadorResult<()>
    where
        D: UiDriver + ?Sized,
    {
        if wait_until_present(driver, &self.locators.virt_root_password, &self.probe)
            .await?
            .is_some()
        {
            fill_field(
                driver,
                &self.locators.virt_root_password,
                &virt.root_password,
                &self.wait,
            )
            .await?;
            let _ = fill_field_optional(
                driver,
                &self.locators.virt_root_password_confirm,
                &virt.root_password,
                &self.probe,
            )
            .await?;
            fill_field(
                driver,
                &self.locators.virt_admin_password,
                &virt.admin_password,
                &self.wait,
            )
            .await?;
            let _ = fill_field_optional(
                driver,
                &self.locators.virt_admin_password_confirm,
                &virt.admin_password,
                &self.probe,
            )
            .await?;
            if let Some(datacenter) = &virt.datacenter {
                fill_field(driver, &self.locators.datacenter_name, datacenter, &self.wait).await?;
            }
            if let Some(cluster) = &virt.cluster {
                fill_field(driver, &self.locators.cluster_name, cluster, &self.wait).await?;
            }
            if let Some(cpu_type) = &virt.cpu_type {
                fill_field(driver, &self.locators.cpu_type, cpu_type, &self.wait).await?;
            }
        }
        self.next(driver).await
    }

    async fn page_storage<D>(&self, driver: &mut D, storage: &StorageSection) -> CatadorResult<()>
    where
        D: UiDriver + ?Sized,
    {
        let kind = self.locators.storage_type.resolve(&storage.kind);
        let _ = click_optional(driver, &kind, &self.probe).await?;

        fill_field(
            driver,
            &self.locators.data_domain_name,
            &storage.data_domain.name,
            &self.wait,
        )
        .await?;
        fill_field(
            driver,
            &self.locators.data_domain_address,
            &storage.data_domain.address,
            &self.wait,
        )
        .await?;
        fill_field(
            driver,
            &self.locators.data_domain_path,
            &storage.data_domain.share_path,
            &self.wait,
        )
        .await?;

        if let Some(export) = &storage.export_domain {
            // The export-domain block only renders for product mixes that
            // need one.
            if wait_until_present(driver, &self.locators.export_domain_name, &self.probe)
                .await?
                .is_some()
            {
                fill_field(driver, &self.locators.export_domain_name, &export.name, &self.wait)
                    .await?;
                fill_field(
                    driver,
                    &self.locators.export_domain_address,
                    &export.address,
                    &self.wait,
                )
                .await?;
                fill_field(
                    driver,
                    &self.locators.export_domain_path,
                    &export.share_path,
                    &self.wait,
                )
                .await?;
            } else {
                warn!("plan provides an export domain but the wizard does not ask for one");
            }
        }
        self.next(driver).await
    }

    async fn page_mgmt_engine<D>(
        &self,
        driver: &mut D,
        engine: &MgmtEngineSection,
    ) -> CatadorResult<()>
    where
        D: UiDriver + ?Sized,
    {
        let location = self.locators.mgmt_install_on.resolve(&engine.install_on);
        let _ = click_optional(driver, &location, &self.probe).await?;
        self.next(driver).await?;

        fill_field(
            driver,
            &self.locators.mgmt_root_password,
            &engine.root_password,
            &self.wait,
        )
        .await?;
        let _ = fill_field_optional(
            driver,
            &self.locators.mgmt_root_password_confirm,
            &engine.root_password,
            &self.probe,
        )
        .await?;
        fill_field(
            driver,
            &self.locators.mgmt_admin_password,
            &engine.admin_password,
            &self.wait,
        )
        .await?;
        let _ = fill_field_optional(
            driver,
            &self.locators.mgmt_admin_password_confirm,
            &engine.admin_password,
            &self.probe,
        )
        .await?;
        self.next(driver).await
    }

    async fn page_subscription_login<D>(
        &self,
        driver: &mut D,
        subscription: &SubscriptionSection,
    ) -> CatadorResult<()>
    where
        D: UiDriver + ?Sized,
    {
        if wait_until_present(driver, &self.locators.subscription_username, &self.probe)
            .await?
            .is_some()
        {
            fill_field(
                driver,
                &self.locators.subscription_username,
                &subscription.username,
                &self.wait,
            )
            .await?;
            fill_field(
                driver,
                &self.locators.subscription_password,
                &subscription.password,
                &self.wait,
            )
            .await?;
        }
        self.next(driver).await
    }

    async fn page_management_app<D>(
        &self,
        driver: &mut D,
        subscription: &SubscriptionSection,
    ) -> CatadorResult<()>
    where
        D: UiDriver + ?Sized,
    {
        let radio = self
            .locators
            .management_app_radio
            .resolve(&subscription.management_app_uuid);
        click_required(driver, &radio, &self.wait).await?;
        self.next(driver).await
    }

    async fn page_select_subscriptions<D>(
        &self,
        driver: &mut D,
        subscription: &SubscriptionSection,
    ) -> CatadorResult<()>
    where
        D: UiDriver + ?Sized,
    {
        for name in &subscription.subscriptions {
            let check = self.locators.subscription_check.resolve(name);
            // A subscription already consumed elsewhere is not offered.
            let _ = click_optional(driver, &check, &self.probe).await?;
        }
        self.next(driver).await
    }

    /// Submit the deployment and wait for the long-running completion.
    ///
    /// The continue control the completion loop probes is the wizard's own
    /// Next button, which the server enables when the deployment finishes.
    pub async fn submit_and_await<D>(
        &self,
        driver: &mut D,
        policy: &CompletionPolicy,
        cancel: &CancellationToken,
    ) -> CatadorResult<CompletionStats>
    where
        D: UiDriver + ?Sized,
    {
        let slow = WaitOptions::new()
            .with_timeout(SUBMIT_CLICKABLE_TIMEOUT_MS)
            .with_poll_interval(self.wait.poll_interval_ms);
        let _ = require_clickable(driver, &self.locators.submit, &slow).await?;
        driver.click(&self.locators.submit).await?;
        info!("deployment submitted");
        await_completion(driver, &self.locators.next, policy, cancel).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{ElementHandle, MockDriver};

    fn wizard() -> DeploymentWizard {
        let mut config = SuiteConfig {
            base_url: "https://server.example".to_string(),
            ..SuiteConfig::default()
        };
        config.wait.probe_ms = 0;
        config.wait.element_ms = 1_000;
        config.wait.poll_ms = 100;
        DeploymentWizard::new(&config).unwrap()
    }

    fn base_plan() -> DeploymentPlan {
        DeploymentPlan {
            server: ServerSection {
                name: "prod-server".to_string(),
                description: "managed by catador".to_string(),
            },
            lifecycle: LifecycleSection {
                update_channel: "stable".to_string(),
                environment_path: None,
            },
            subscription: SubscriptionSection {
                username: "portal-user".to_string(),
                password: "portal-pass".to_string(),
                management_app_uuid: "4f3a".to_string(),
                subscriptions: vec!["Premium".to_string()],
            },
            ..DeploymentPlan::default()
        }
    }

    fn install_base_pages(mock: &mut MockDriver, wizard: &DeploymentWizard, plan: &DeploymentPlan) {
        mock.install_default(&wizard.locators.next);
        mock.install_default(&wizard.locators.select_products);
        mock.install_default(
            &wizard
                .locators
                .update_channel
                .resolve(&plan.lifecycle.update_channel),
        );
        mock.install_default(
            &wizard
                .locators
                .management_app_radio
                .resolve(&plan.subscription.management_app_uuid),
        );
    }

    #[tokio::test(start_paused = true)]
    async fn base_walk_clicks_next_once_per_page() {
        let wizard = wizard();
        let plan = base_plan();
        let mut mock = MockDriver::new();
        install_base_pages(&mut mock, &wizard, &plan);

        wizard.run(&mut mock, &plan).await.unwrap();
        // Server config, organization, lifecycle, analytics, login,
        // management app, subscriptions, review subscriptions.
        assert_eq!(mock.call_count("click:css:#wizard_next"), 8);
        assert!(mock.was_called("navigate:https://server.example/deployments/new"));
    }

    #[tokio::test(start_paused = true)]
    async fn server_fields_fill_when_rendered() {
        let wizard = wizard();
        let plan = base_plan();
        let mut mock = MockDriver::new();
        install_base_pages(&mut mock, &wizard, &plan);
        mock.install_default(&wizard.locators.server_name);
        mock.install_default(&wizard.locators.server_description);

        wizard.run(&mut mock, &plan).await.unwrap();
        assert!(mock.was_called("type:css:#server_name:prod-server"));
    }

    #[tokio::test(start_paused = true)]
    async fn missing_update_channel_is_fatal_and_stops_the_walk() {
        let wizard = wizard();
        let plan = base_plan();
        let mut mock = MockDriver::new();
        mock.install_default(&wizard.locators.next);
        mock.install_default(&wizard.locators.select_products);
        // Update-channel radio deliberately absent.

        let err = wizard.run(&mut mock, &plan).await.unwrap_err();
        assert!(matches!(err, CatadorError::ElementNotFound { .. }));
        assert!(err.to_string().contains("update-channel radio"));
        // The walk stopped on the lifecycle page: two Next clicks made it
        // through the server pages, none after.
        assert_eq!(mock.call_count("click:css:#wizard_next"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn plan_validation_rejects_product_without_section() {
        let plan = DeploymentPlan {
            products: vec![DeploymentProduct::Virtualization],
            ..base_plan()
        };
        assert!(matches!(
            plan.validate().unwrap_err(),
            CatadorError::Config { .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn plan_validation_rejects_section_without_product() {
        let plan = DeploymentPlan {
            mgmt_engine: Some(MgmtEngineSection {
                install_on: "engine-host".to_string(),
                root_password: "secret".to_string(),
                admin_password: "secret".to_string(),
            }),
            ..base_plan()
        };
        assert!(plan.validate().is_err());
    }

    fn virt_plan() -> DeploymentPlan {
        DeploymentPlan {
            products: vec![DeploymentProduct::Virtualization],
            virt: Some(VirtSection {
                setup_type: "self-hosted".to_string(),
                engine_mac: "52:54:00:aa:00:01".to_string(),
                hypervisor_macs: vec![
                    "52:54:00:aa:00:02".to_string(),
                    "52:54:00:aa:00:03".to_string(),
                ],
                root_password: "hv-secret".to_string(),
                admin_password: "engine-secret".to_string(),
                datacenter: None,
                cluster: None,
                cpu_type: None,
                storage: StorageSection {
                    kind: "nfs".to_string(),
                    data_domain: DomainSpec {
                        name: "data".to_string(),
                        address: "nas.example".to_string(),
                        share_path: "/exports/data".to_string(),
                    },
                    export_domain: None,
                },
            }),
            ..base_plan()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn virt_walk_selects_every_hypervisor() {
        let wizard = wizard();
        let plan = virt_plan();
        let virt = plan.virt.as_ref().unwrap();
        let mut mock = MockDriver::new();
        install_base_pages(&mut mock, &wizard, &plan);
        mock.install_default(
            &wizard.locators.product_check.resolve(DeploymentProduct::Virtualization.slug()),
        );
        mock.install_default(&wizard.locators.engine_mac_radio.resolve(&virt.engine_mac));
        for mac in &virt.hypervisor_macs {
            mock.install_default(&wizard.locators.hypervisor_mac_check.resolve(mac));
        }
        mock.install_default(&wizard.locators.virt_root_password);
        mock.install_default(&wizard.locators.virt_admin_password);
        mock.install_default(&wizard.locators.data_domain_name);
        mock.install_default(&wizard.locators.data_domain_address);
        mock.install_default(&wizard.locators.data_domain_path);

        wizard.run(&mut mock, &plan).await.unwrap();
        assert_eq!(
            mock.call_count("click:xpath://input[@name='hypervisor_hosts'"),
            2
        );
        assert!(mock.was_called("type:css:#virt_root_password:hv-secret"));
        // Setup-type radio absent: the walk kept the default and moved on.
        assert!(!mock.was_called("click:xpath://input[@name='setup_type'"));
    }

    #[tokio::test(start_paused = true)]
    async fn node_registration_adds_rows_after_the_first() {
        let wizard = wizard();
        let node = |last: u8| NodeSpec {
            driver: "ipmi".to_string(),
            ip_address: format!("10.0.0.{last}"),
            username: "power".to_string(),
            password: "secret".to_string(),
            mac_address: format!("52:54:00:bb:00:0{last}"),
        };
        let plan = DeploymentPlan {
            products: vec![DeploymentProduct::CloudInfrastructure],
            cloud: Some(CloudSection {
                undercloud_address: "10.0.0.2".to_string(),
                undercloud_user: "stack".to_string(),
                undercloud_password: "secret".to_string(),
                nodes: vec![node(4), node(5)],
            }),
            ..base_plan()
        };
        let mut mock = MockDriver::new();
        install_base_pages(&mut mock, &wizard, &plan);
        mock.install_default(
            &wizard
                .locators
                .product_check
                .resolve(DeploymentProduct::CloudInfrastructure.slug()),
        );
        for locator in [
            &wizard.locators.undercloud_address,
            &wizard.locators.undercloud_user,
            &wizard.locators.undercloud_password,
            &wizard.locators.detect_undercloud,
            &wizard.locators.register_nodes,
            &wizard.locators.add_node,
            &wizard.locators.node_driver_select,
            &wizard.locators.node_ip,
            &wizard.locators.node_user,
            &wizard.locators.node_password,
            &wizard.locators.node_mac,
            &wizard.locators.submit_nodes,
        ] {
            mock.install_default(locator);
        }
        mock.install_default(&wizard.locators.node_driver_item.resolve("ipmi"));

        wizard.run(&mut mock, &plan).await.unwrap();
        // One Add Node for the second row only; every row gets its fields.
        assert_eq!(mock.call_count("click:css:#add_node"), 1);
        assert_eq!(mock.call_count("type:css:#node_ip_address"), 2);
        assert!(mock.was_called("type:css:#node_nic_mac:52:54:00:bb:00:05"));
    }

    #[tokio::test(start_paused = true)]
    async fn submit_and_await_clicks_deploy_then_polls() {
        let wizard = wizard();
        let mut mock = MockDriver::new();
        mock.install_default(&wizard.locators.submit);
        mock.script_presence(&wizard.locators.next, &[false, true]);

        let policy = CompletionPolicy::new()
            .with_poll_interval_secs(1)
            .with_refresh_backoff_secs(1);
        let stats = wizard
            .submit_and_await(&mut mock, &policy, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(stats.attempts, 2);
        let history = mock.history();
        let deploy_at = history
            .iter()
            .position(|c| c == "click:css:#wizard_deploy")
            .unwrap();
        let poll_at = history
            .iter()
            .position(|c| c.starts_with("find:css:#wizard_next"))
            .unwrap();
        assert!(deploy_at < poll_at);
    }

    #[test]
    fn plans_round_trip_through_yaml() {
        let plan = virt_plan();
        let yaml = serde_yaml_ng::to_string(&plan).unwrap();
        let back: DeploymentPlan = serde_yaml_ng::from_str(&yaml).unwrap();
        assert_eq!(back, plan);
    }

    #[test]
    fn load_validates_the_plan() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.yaml");
        std::fs::write(
            &path,
            "products: [virtualization]\nlifecycle:\n  update_channel: stable\n",
        )
        .unwrap();
        // Selects virtualization without a virt section.
        assert!(DeploymentPlan::load(&path).is_err());
    }
}
