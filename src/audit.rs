/// Identifies who/what performed an action, threaded through handlers for
/// future audit-log wiring (mirrors the teacher's one-line `audit.rs`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor<'a> {
    pub tenant: &'a str,
    pub client: Option<&'a str>,
}

impl<'a> Actor<'a> {
    pub fn new(tenant: &'a str, client: Option<&'a str>) -> Self {
        Self { tenant, client }
    }
}
