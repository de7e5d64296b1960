#![allow(dead_code)]

use matdiscover_core::db::open_db_in_memory;
use matdiscover_core::{MaterialAllowlist, MaterialInfo, SqliteProvenanceStore};
use rusqlite::{params, Connection};
use serde_json::{json, Value};
use uuid::Uuid;

pub const PREFIX: &str = "curated-mof";

/// In-memory provenance store with helpers to seed nodes, groups and links.
pub struct ProvenanceFixture {
    store: SqliteProvenanceStore,
}

impl ProvenanceFixture {
    pub fn new() -> Self {
        let conn = open_db_in_memory().unwrap();
        Self {
            store: SqliteProvenanceStore::from_connection(conn),
        }
    }

    pub fn store(&self) -> &SqliteProvenanceStore {
        &self.store
    }

    pub fn into_store(self) -> SqliteProvenanceStore {
        self.store
    }

    pub fn conn(&self) -> &Connection {
        self.store.connection()
    }

    pub fn node(
        &self,
        node_type: &str,
        label: &str,
        tag: Option<&str>,
        attributes: Value,
        extras: Value,
        content: Option<&str>,
    ) -> Uuid {
        let uuid = Uuid::new_v4();
        self.conn()
            .execute(
                "INSERT INTO nodes (uuid, node_type, label, tag, attributes, extras, content)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
                params![
                    uuid.to_string(),
                    node_type,
                    label,
                    tag,
                    attributes.to_string(),
                    extras.to_string(),
                    content
                ],
            )
            .unwrap();
        uuid
    }

    pub fn record(&self, label: &str, tag: Option<&str>, attributes: Value) -> Uuid {
        self.node("record", label, tag, attributes, json!({}), None)
    }

    pub fn workchain(&self, label: &str) -> Uuid {
        self.node("workchain", label, None, json!({}), json!({}), None)
    }

    pub fn group(&self, label: &str, members: &[Uuid]) {
        self.conn()
            .execute("INSERT INTO node_groups (label) VALUES (?1);", [label])
            .unwrap();
        let group_id = self.conn().last_insert_rowid();
        for member in members {
            self.add_to_group(group_id, *member);
        }
    }

    pub fn add_to_group_labelled(&self, label: &str, member: Uuid) {
        let group_id: i64 = self
            .conn()
            .query_row(
                "SELECT id FROM node_groups WHERE label = ?1;",
                [label],
                |row| row.get(0),
            )
            .unwrap();
        self.add_to_group(group_id, member);
    }

    fn add_to_group(&self, group_id: i64, member: Uuid) {
        self.conn()
            .execute(
                "INSERT INTO group_members (group_id, node_uuid) VALUES (?1, ?2);",
                params![group_id, member.to_string()],
            )
            .unwrap();
    }

    pub fn link(&self, source: Uuid, target: Uuid, link_type: &str, label: &str) {
        self.conn()
            .execute(
                "INSERT INTO links (source_uuid, target_uuid, link_type, label)
                 VALUES (?1, ?2, ?3, ?4);",
                params![source.to_string(), target.to_string(), link_type, label],
            )
            .unwrap();
    }

    /// Seeds one curated group `<PREFIX>_<id>_v<version>`.
    ///
    /// Every material gets `orig_cif` and `orig_zeopp`; optimized ones also
    /// get `opt_cif_ddec`, `opt_zeopp` and `dftopt`.
    pub fn curated_material(&self, material_id: &str, version: u32, optimized: bool) -> SeededMaterial {
        let orig_cif = self.node(
            "structure",
            material_id,
            Some("orig_cif"),
            json!({ "formula": "C16H10O4Zn" }),
            json!({
                "name_conventional": format!("{material_id}-name-v{version}"),
                "doi_ref": "10.1000/example",
                "class_material": "mof",
                "workflow_version": version,
            }),
            Some(&format!("data_{material_id}_orig")),
        );
        let orig_zeopp = self.record(
            "zeopp",
            Some("orig_zeopp"),
            geometry(1.25, 1000.9, 0.5),
        );
        let mut members = vec![orig_cif, orig_zeopp];

        let mut seeded = SeededMaterial {
            group_label: group_label(material_id, version),
            orig_cif,
            orig_zeopp,
            opt_cif_ddec: None,
            opt_zeopp: None,
            dftopt: None,
        };

        if optimized {
            let opt_cif_ddec = self.node(
                "structure",
                material_id,
                Some("opt_cif_ddec"),
                json!({}),
                json!({}),
                Some(&format!("data_{material_id}_ddec")),
            );
            let opt_zeopp = self.record("zeopp", Some("opt_zeopp"), geometry(1.0, 1500.4, 0.6));
            let dftopt = self.record(
                "cp2k",
                Some("dftopt"),
                json!({
                    "natoms": 4,
                    "step_info": { "energy_au": [-8.0, -8.4, -8.2], "step": [0, 1, 0] },
                    "stage_info": { "nsteps": [2, 1] }
                }),
            );
            members.extend([opt_cif_ddec, opt_zeopp, dftopt]);
            seeded.opt_cif_ddec = Some(opt_cif_ddec);
            seeded.opt_zeopp = Some(opt_zeopp);
            seeded.dftopt = Some(dftopt);
        }

        self.group(&seeded.group_label, &members);
        seeded
    }

    pub fn revision(&self) -> i64 {
        self.conn()
            .query_row(
                "SELECT value FROM store_meta WHERE key = 'revision';",
                [],
                |row| row.get(0),
            )
            .unwrap()
    }
}

pub struct SeededMaterial {
    pub group_label: String,
    pub orig_cif: Uuid,
    pub orig_zeopp: Uuid,
    pub opt_cif_ddec: Option<Uuid>,
    pub opt_zeopp: Option<Uuid>,
    pub dftopt: Option<Uuid>,
}

pub fn group_label(material_id: &str, version: u32) -> String {
    format!("{PREFIX}_{material_id}_v{version}")
}

pub fn geometry(density: f64, asa: f64, void_fraction: f64) -> Value {
    json!({
        "Density": density,
        "ASA_m^2/g": asa,
        "ASA_m^2/cm^3": asa * density,
        "NASA_m^2/g": 0.0,
        "AV_Volume_fraction": void_fraction,
        "AV_cm^3/g": void_fraction / density,
        "POAV_Volume_fraction": void_fraction,
        "POAV_cm^3/g": void_fraction / density,
        "PONAV_cm^3/g": 0.0,
        "Largest_free_sphere": 6.5,
        "Largest_included_sphere": 7.25,
    })
}

/// Allowlist with `(refcode, idx)` rows.
pub fn allowlist(rows: &[(&str, i64)]) -> MaterialAllowlist {
    MaterialAllowlist::from_entries(
        rows.iter()
            .map(|(refcode, idx)| MaterialInfo {
                refcode: refcode.to_string(),
                idx: *idx,
                ligand: format!("{refcode}-ligand"),
                elements: "C,H,O,Zn".to_string(),
                name: format!("{refcode} allowlist name"),
            })
            .collect(),
    )
    .unwrap()
}
