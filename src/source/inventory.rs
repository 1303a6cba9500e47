//! Virtualization inventories.
//!
//! An inventory is a JSON containment tree exported from one management
//! endpoint: the endpoint itself at the root, datacenters and folders below
//! it and the virtual machines as leaves, each carrying its properties.

use aggregate::tree::{self, Node, Visit};
use aggregate::Leaf;
use serde_json;
use source::{json_to_field, json_to_tag, Error};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Placeholder for an absent container.
pub const NONE: &str = "None";

/// Which entity properties become tags and fields.
#[derive(Clone, Debug, PartialEq)]
pub struct InventoryConfig {
    /// Property names used as tags.
    pub tags: Vec<String>,
    /// Property names used as fields.
    pub fields: Vec<String>,
}

impl Default for InventoryConfig {
    fn default() -> InventoryConfig {
        InventoryConfig {
            tags: vec!["name".to_string()],
            fields: vec![
                "config.hardware.numCPU".to_string(),
                "config.hardware.memoryMB".to_string(),
                "guest.guestState".to_string(),
                "summary.storage.committed".to_string(),
            ],
        }
    }
}

/// Reads inventory files into leaves.
#[derive(Clone, Debug, Default)]
pub struct Inventory {
    config: InventoryConfig,
}

impl Inventory {
    /// Create a reader.
    pub fn new(config: InventoryConfig) -> Inventory {
        Inventory { config: config }
    }

    /// Read and convert the inventory file at `path`.
    pub fn collect(&self, path: &str) -> Result<Vec<Leaf>, Error> {
        let mut contents = String::new();
        File::open(Path::new(path))
            .and_then(|mut f| f.read_to_string(&mut contents))
            .map_err(|e| Error::EndpointUnavailable {
                endpoint: path.to_string(),
                reason: e.to_string(),
            })?;
        let root: Node = serde_json::from_str(&contents)?;
        Ok(self.leaves(&root))
    }

    /// Every entity below `root` as a leaf, in walk order.
    ///
    /// Entities lacking a configured tag or field are logged and dropped.
    pub fn leaves(&self, root: &Node) -> Vec<Leaf> {
        let mut leaves = Vec::new();
        for visit in tree::walk(root) {
            match self.leaf(&root.name, &visit) {
                Ok(leaf) => leaves.push(leaf),
                Err(e) => warn!("{}", e),
            }
        }
        leaves
    }

    fn leaf(&self, vcenter: &str, visit: &Visit) -> Result<Leaf, Error> {
        let entity = visit.entity();
        let missing = |field: &str| Error::MissingField {
            record: visit.path(),
            field: field.to_string(),
        };

        let datacenter = match visit.datacenter() {
            Some(dc) => dc.name.as_str(),
            None => NONE,
        };
        let folders = visit.folders();
        let top_level_folder = folders.first().cloned().unwrap_or(NONE);
        let mut folder_path = String::new();
        for folder in &folders {
            folder_path.push('/');
            folder_path.push_str(folder);
        }

        let mut path = vec![vcenter, datacenter, top_level_folder];
        path.extend(folders.iter().skip(1));
        path.push(&entity.name);
        let mut leaf = Leaf::from_segments(path);

        for tag in &self.config.tags {
            let value = entity
                .properties
                .get(tag)
                .and_then(json_to_tag)
                .ok_or_else(|| missing(tag))?;
            leaf.tags.insert(tag.clone(), value);
        }
        for field in &self.config.fields {
            let value = entity
                .properties
                .get(field)
                .and_then(json_to_field)
                .ok_or_else(|| missing(field))?;
            leaf.fields.insert(field.clone(), value);
        }
        leaf.tags.insert("vcenter".to_string(), vcenter.to_string());
        leaf.tags.insert("datacenter".to_string(), datacenter.to_string());
        leaf.tags.insert("folderPath".to_string(), folder_path);
        leaf.tags
            .insert("topLevelFolder".to_string(), top_level_folder.to_string());
        Ok(leaf)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use metric::FieldValue;

    const INVENTORY: &str = r#"{
        "name": "vc1.example.com",
        "children": [
            {"name": "East", "kind": "datacenter", "children": [
                {"name": "web", "children": [
                    {"name": "frontend", "children": [
                        {"name": "web02", "kind": "vm", "properties": {
                            "name": "web02",
                            "config.hardware.numCPU": 2,
                            "config.hardware.memoryMB": 4096,
                            "guest.guestState": "running",
                            "summary.storage.committed": 1000
                        }}
                    ]},
                    {"name": "web01", "kind": "vm", "properties": {
                        "name": "web01",
                        "config.hardware.numCPU": 4,
                        "config.hardware.memoryMB": 8192,
                        "guest.guestState": "running",
                        "summary.storage.committed": 3000
                    }}
                ]},
                {"name": "orphan", "kind": "vm", "properties": {
                    "name": "orphan",
                    "config.hardware.numCPU": 1,
                    "config.hardware.memoryMB": 512,
                    "guest.guestState": "notRunning",
                    "summary.storage.committed": 10
                }},
                {"name": "broken", "kind": "vm", "properties": {"name": "broken"}}
            ]}
        ]
    }"#;

    fn leaves() -> Vec<Leaf> {
        let root: Node = serde_json::from_str(INVENTORY).unwrap();
        Inventory::default().leaves(&root)
    }

    #[test]
    fn leaves_carry_containment_tags() {
        let leaves = leaves();
        assert_eq!(3, leaves.len());

        let orphan = &leaves[0];
        assert_eq!("vc1.example.com/East/None/orphan", orphan.path());
        assert_eq!(Some(&"None".to_string()), orphan.tags.get("topLevelFolder"));
        assert_eq!(Some(&"".to_string()), orphan.tags.get("folderPath"));

        let nested = &leaves[1];
        assert_eq!("vc1.example.com/East/web/frontend/web02", nested.path());
        assert_eq!(Some(&"/web/frontend".to_string()), nested.tags.get("folderPath"));
        assert_eq!(Some(&"web".to_string()), nested.tags.get("topLevelFolder"));
        assert_eq!(Some(&"East".to_string()), nested.tags.get("datacenter"));
        assert_eq!(Some(&"vc1.example.com".to_string()), nested.tags.get("vcenter"));
        assert_eq!(Some(&"web02".to_string()), nested.tags.get("name"));

        let web01 = &leaves[2];
        assert_eq!("vc1.example.com/East/web/web01", web01.path());
        assert_eq!(
            Some(&FieldValue::Integer(3000)),
            web01.fields.get("summary.storage.committed")
        );
        assert_eq!(Some(&FieldValue::from("running")), web01.fields.get("guest.guestState"));
    }

    #[test]
    fn missing_file_is_unavailable() {
        match Inventory::default().collect("/nonexistent/inventory.json") {
            Err(Error::EndpointUnavailable { endpoint, .. }) => {
                assert_eq!("/nonexistent/inventory.json", endpoint)
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
