use crate::entity::tenant::Tenant;

/// External collaborator responsible for rendering/translating HTML pages
/// and syncing per-tenant template assets (spec §1 non-goal, §6 "Template
/// source"). The core only needs to notify it of tenant lifecycle events.
pub trait TemplateSource: Send + Sync {
    fn sync(&self, tenant: &Tenant);
    fn purge(&self, tenant_name: &str);
}

#[derive(Default, Clone, Copy)]
pub struct NullTemplateSource;

impl TemplateSource for NullTemplateSource {
    fn sync(&self, _tenant: &Tenant) {}
    fn purge(&self, _tenant_name: &str) {}
}
