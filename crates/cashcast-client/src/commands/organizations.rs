use std::path::Path;

use crate::ClientResult;
use crate::commands::common::{open_context, open_scoped_context, require_text};
use crate::contracts::envelope::{SuccessEnvelope, success};
use crate::contracts::types::{BankData, BankListData, OrganizationData, OrganizationListData};

#[derive(Debug, Default)]
pub struct OrganizationCreateOptions<'a> {
    pub name: String,
    pub home_override: Option<&'a Path>,
}

#[doc(hidden)]
pub fn create_with_options(options: OrganizationCreateOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let name = require_text(&options.name, "name", "org create")?;
    let context = open_context(options.home_override, None)?;
    let organization = context.store.create_organization(&name)?;
    tracing::info!(organization_id = %organization.organization_id, "organization created");
    success("org create", OrganizationData { organization })
}

#[doc(hidden)]
pub fn list_with_options(home_override: Option<&Path>) -> ClientResult<SuccessEnvelope> {
    let context = open_context(home_override, None)?;
    let organizations = context.store.list_organizations()?;
    success("org list", OrganizationListData { organizations })
}

#[derive(Debug, Default)]
pub struct BankCreateOptions<'a> {
    pub organization_id: String,
    pub name: String,
    pub home_override: Option<&'a Path>,
}

#[doc(hidden)]
pub fn create_bank_with_options(options: BankCreateOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let name = require_text(&options.name, "name", "bank create")?;
    let (context, organization) =
        open_scoped_context(options.home_override, None, &options.organization_id)?;
    let bank = context
        .store
        .create_bank(&organization.organization_id, &name)?;
    tracing::info!(
        organization_id = %organization.organization_id,
        bank_id = %bank.bank_id,
        "bank created"
    );
    success("bank create", BankData { bank })
}

#[doc(hidden)]
pub fn list_banks_with_options(
    organization_id: &str,
    home_override: Option<&Path>,
) -> ClientResult<SuccessEnvelope> {
    let (context, organization) = open_scoped_context(home_override, None, organization_id)?;
    let banks = context.store.list_banks(&organization.organization_id)?;
    success(
        "bank list",
        BankListData {
            organization_id: organization.organization_id,
            banks,
        },
    )
}
