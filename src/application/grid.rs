//! Grid view: column descriptors plus the path-annotated rows.
//!
//! Only consumes [`TreeStore::get_tree_data_for_grid`]; never the store's indices.

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::domain::{Node, TreeStore};

/// One grid column. Serialized in camelCase for grid front ends.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDef {
    #[serde(alias = "header_name")]
    pub header_name: String,
    /// Node field shown in this column: `id`, `label`, `parent` or `path`
    pub field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, alias = "min_width", skip_serializing_if = "Option::is_none")]
    pub min_width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flex: Option<u32>,
}

impl Default for ColumnDef {
    fn default() -> Self {
        Self {
            header_name: "Name".to_string(),
            field: "label".to_string(),
            width: Some(200),
            min_width: Some(200),
            flex: Some(1),
        }
    }
}

/// Options applied to every column unless the column overrides them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DefaultColumnDef {
    pub sortable: bool,
    pub filter: bool,
    pub resizable: bool,
    pub editable: bool,
}

impl Default for DefaultColumnDef {
    fn default() -> Self {
        Self {
            sortable: false,
            filter: false,
            resizable: true,
            editable: false,
        }
    }
}

/// Everything a grid needs to display the tree.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GridView {
    pub column_defs: Vec<ColumnDef>,
    pub default_col_def: DefaultColumnDef,
    pub row_data: Vec<Node>,
}

impl GridView {
    pub fn new(store: &TreeStore, columns: &[ColumnDef], default_column: DefaultColumnDef) -> Self {
        Self {
            column_defs: columns.to_vec(),
            default_col_def: default_column,
            row_data: store.get_tree_data_for_grid(),
        }
    }

    /// Plain-text table: header line, then one line per row.
    ///
    /// The first column is indented by tree depth.
    pub fn render_text(&self, indent: usize) -> String {
        let header = self.column_defs.iter().map(|c| c.header_name.as_str()).join("\t");
        let mut lines = vec![header];

        for row in &self.row_data {
            let depth = row.path.as_ref().map_or(1, Vec::len).saturating_sub(1);
            let line = self
                .column_defs
                .iter()
                .enumerate()
                .map(|(i, column)| {
                    let value = cell_value(row, &column.field);
                    if i == 0 {
                        format!("{}{}", " ".repeat(depth * indent), value)
                    } else {
                        value
                    }
                })
                .join("\t");
            lines.push(line);
        }

        lines.join("\n")
    }
}

/// Cell text for a node field; unknown fields render empty.
pub fn cell_value(node: &Node, field: &str) -> String {
    match field {
        "id" => node.id.to_string(),
        "label" => node.label.clone(),
        "parent" => node.parent.as_ref().map(ToString::to_string).unwrap_or_default(),
        "path" => node
            .path
            .as_ref()
            .map(|path| path.iter().join("/"))
            .unwrap_or_default(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> TreeStore {
        TreeStore::new(vec![
            Node::root(1, "A"),
            Node::child(2, 1, "B"),
            Node::child(3, 2, "C"),
        ])
        .unwrap()
    }

    #[test]
    fn given_default_columns_when_building_view_then_label_column() {
        let view = GridView::new(&store(), &[ColumnDef::default()], DefaultColumnDef::default());
        assert_eq!(view.column_defs[0].field, "label");
        assert_eq!(view.row_data.len(), 3);
        assert!(view.default_col_def.resizable);
        assert!(!view.default_col_def.sortable);
    }

    #[test]
    fn given_view_when_serializing_then_camel_case_keys() {
        let view = GridView::new(&store(), &[ColumnDef::default()], DefaultColumnDef::default());
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["columnDefs"][0]["headerName"], "Name");
        assert_eq!(json["columnDefs"][0]["minWidth"], 200);
        assert_eq!(json["rowData"][2]["path"], serde_json::json!(["1", "2", "3"]));
        assert_eq!(json["defaultColDef"]["editable"], false);
    }

    #[test]
    fn given_rows_when_rendering_text_then_indents_first_column() {
        let columns = vec![
            ColumnDef::default(),
            ColumnDef {
                header_name: "Path".into(),
                field: "path".into(),
                width: None,
                min_width: None,
                flex: None,
            },
        ];
        let view = GridView::new(&store(), &columns, DefaultColumnDef::default());

        let text = view.render_text(2);

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Name\tPath");
        assert_eq!(lines[1], "A\t1");
        assert_eq!(lines[2], "  B\t1/2");
        assert_eq!(lines[3], "    C\t1/2/3");
    }

    #[test]
    fn given_unknown_field_when_reading_cell_then_empty() {
        let node = Node::root(1, "A");
        assert_eq!(cell_value(&node, "colour"), "");
        assert_eq!(cell_value(&node, "parent"), "");
    }
}
