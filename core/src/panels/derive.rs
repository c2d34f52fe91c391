use dashboard_types::QuerySnapshot;

/// One active panel: a field and which of its views were requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelDescriptor {
    pub field: String,
    pub wants_table: bool,
    pub wants_chart: bool,
}

/// Active panels for a snapshot, in field-config order.
///
/// Configs with neither table nor chart requested produce no panel. An empty
/// result is the empty-dashboard state, not an error.
pub fn derive_panels(snapshot: &QuerySnapshot) -> Vec<PanelDescriptor> {
    snapshot
        .field_configs()
        .iter()
        .filter(|c| c.show_table || c.show_chart)
        .map(|c| PanelDescriptor {
            field: c.field.clone(),
            wants_table: c.show_table,
            wants_chart: c.show_chart,
        })
        .collect()
}
