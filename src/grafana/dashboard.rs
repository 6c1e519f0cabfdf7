//! Dashboard description parsing and panel selection.

use super::GrafanaError;
use serde::Deserialize;
use std::collections::HashSet;

/// One panel extracted from a dashboard description. `snapshot_url` stays
/// empty until a snapshot session exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelDescriptor {
    pub id: i64,
    pub title: String,
    pub snapshot_url: String,
}

#[derive(Debug, Deserialize)]
struct DashboardDoc {
    #[serde(default)]
    panels: Vec<PanelDoc>,
}

#[derive(Debug, Deserialize)]
struct PanelDoc {
    id: i64,
    #[serde(default)]
    title: String,
}

/// Extract the dashboard title from the raw description.
pub fn dashboard_title(dashboard: &serde_json::Value) -> Result<String, GrafanaError> {
    let title = dashboard
        .get("title")
        .and_then(|t| t.as_str())
        .unwrap_or_default();

    if title.is_empty() {
        return Err(GrafanaError::InvalidPayload(
            "dashboard description has no title".to_string(),
        ));
    }

    Ok(title.to_string())
}

/// Extract the full panel list (id, title) from the raw description.
pub fn panel_descriptors(dashboard: &serde_json::Value) -> Result<Vec<PanelDescriptor>, GrafanaError> {
    let doc: DashboardDoc = serde_json::from_value(dashboard.clone())
        .map_err(|e| GrafanaError::InvalidPayload(e.to_string()))?;

    Ok(doc
        .panels
        .into_iter()
        .map(|p| PanelDescriptor {
            id: p.id,
            title: p.title,
            snapshot_url: String::new(),
        })
        .collect())
}

/// Apply inclusion/exclusion filters to the full panel list.
///
/// A non-empty include list wins: the result is exactly the panels whose id
/// appears in it (ids the dashboard does not have are silently dropped) and
/// the exclude list is ignored. Otherwise a non-empty exclude list
/// subtracts. Otherwise the list passes through unchanged.
pub fn select_panels(
    panels: Vec<PanelDescriptor>,
    include: &[i64],
    exclude: &[i64],
) -> Vec<PanelDescriptor> {
    if !include.is_empty() {
        let wanted: HashSet<i64> = include.iter().copied().collect();
        return panels
            .into_iter()
            .filter(|p| wanted.contains(&p.id))
            .collect();
    }

    if !exclude.is_empty() {
        let dropped: HashSet<i64> = exclude.iter().copied().collect();
        return panels
            .into_iter()
            .filter(|p| !dropped.contains(&p.id))
            .collect();
    }

    panels
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeSet;

    fn universe() -> Vec<PanelDescriptor> {
        [(1, "A"), (2, "B"), (3, "C"), (4, "D")]
            .into_iter()
            .map(|(id, title)| PanelDescriptor {
                id,
                title: title.to_string(),
                snapshot_url: String::new(),
            })
            .collect()
    }

    fn ids(panels: &[PanelDescriptor]) -> BTreeSet<i64> {
        panels.iter().map(|p| p.id).collect()
    }

    #[test]
    fn test_include_wins_over_exclude() {
        // Exclusions are ignored whenever an include list is present, even
        // when both name the same ids.
        let selected = select_panels(universe(), &[2, 3], &[2, 3]);
        assert_eq!(ids(&selected), BTreeSet::from([2, 3]));
    }

    #[test]
    fn test_include_drops_unknown_ids() {
        let selected = select_panels(universe(), &[3, 99], &[]);
        assert_eq!(ids(&selected), BTreeSet::from([3]));
    }

    #[test]
    fn test_exclude_subtracts() {
        let selected = select_panels(universe(), &[], &[1, 4]);
        assert_eq!(ids(&selected), BTreeSet::from([2, 3]));
    }

    #[test]
    fn test_no_filters_is_identity() {
        let selected = select_panels(universe(), &[], &[]);
        assert_eq!(ids(&selected), BTreeSet::from([1, 2, 3, 4]));
    }

    #[test]
    fn test_empty_universe_yields_empty_result() {
        assert!(select_panels(vec![], &[1, 2], &[3]).is_empty());
        assert!(select_panels(vec![], &[], &[]).is_empty());
    }

    #[test]
    fn test_panel_descriptors_from_dashboard_json() {
        let dashboard = json!({
            "title": "Service overview",
            "panels": [
                {"id": 1, "title": "CPU"},
                {"id": 2, "title": "Memory"},
                {"id": 7}
            ]
        });

        let panels = panel_descriptors(&dashboard).unwrap();
        assert_eq!(panels.len(), 3);
        assert_eq!(panels[0].id, 1);
        assert_eq!(panels[0].title, "CPU");
        assert_eq!(panels[2].title, "");
        assert!(panels.iter().all(|p| p.snapshot_url.is_empty()));

        assert_eq!(dashboard_title(&dashboard).unwrap(), "Service overview");
    }

    #[test]
    fn test_malformed_panels_is_a_parse_error() {
        let dashboard = json!({
            "title": "broken",
            "panels": [{"id": "not-a-number"}]
        });

        assert!(matches!(
            panel_descriptors(&dashboard),
            Err(GrafanaError::InvalidPayload(_))
        ));
    }

    #[test]
    fn test_missing_title_rejected() {
        let dashboard = json!({"panels": []});
        assert!(matches!(
            dashboard_title(&dashboard),
            Err(GrafanaError::InvalidPayload(_))
        ));
    }
}
