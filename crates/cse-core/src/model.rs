use serde_json::json;

use crate::path::{FieldPath, find_first};
use crate::script::{NodeRef, ParsedDocument};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SaveSummary {
    pub empire_name: Option<String>,
    pub game_date: Option<String>,
    pub version: Option<String>,
    pub ironman: bool,
    pub planets: Vec<PlanetSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanetSummary {
    pub id: String,
    pub name: String,
    pub class: String,
    pub size: i64,
}

/// Path of planet `id`'s `planet_size` field, wherever the planet table sits.
pub fn planet_size_path(doc: &ParsedDocument, id: &str) -> Option<FieldPath> {
    let planet = planet_table(doc)?.child(id)?;
    let mut path = planet.path()?;
    path.push("planet_size");
    Some(path)
}

impl ParsedDocument {
    pub fn as_save_summary(&self) -> SaveSummary {
        let root = self.root();
        let scalar = |name: &str| {
            root.child(name)
                .and_then(|n| n.value_unquoted())
                .map(str::to_string)
        };
        let empire_name = find_first(root, "empire")
            .and_then(|e| e.child("name"))
            .and_then(|n| n.child("key"))
            .and_then(|k| k.value_unquoted())
            .map(str::to_string);
        let planets = planet_table(self)
            .map(|table| {
                table
                    .children()
                    .filter(|p| p.is_block())
                    .filter_map(planet_summary)
                    .collect()
            })
            .unwrap_or_default();
        SaveSummary {
            empire_name,
            game_date: scalar("date"),
            version: scalar("version"),
            ironman: root.child("ironman").and_then(|n| n.value()) == Some("yes"),
            planets,
        }
    }
}

// Real saves wrap the table as `planets={ planet={ 0={...} } }`.
fn planet_table(doc: &ParsedDocument) -> Option<NodeRef<'_>> {
    let planets = doc.root().child("planets")?;
    Some(planets.child("planet").unwrap_or(planets))
}

fn planet_summary(p: NodeRef<'_>) -> Option<PlanetSummary> {
    let id = p.name()?;
    if !id.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let field = |name: &str| p.child(name).and_then(|n| n.value_unquoted());
    Some(PlanetSummary {
        id: id.to_string(),
        name: planet_name(p).unwrap_or("Unknown").to_string(),
        class: field("planet_class").unwrap_or_default().to_string(),
        size: field("planet_size").and_then(|s| s.parse().ok()).unwrap_or(0),
    })
}

// name={ key="..." variables={ { key="NAME" value={ key="Earth" } } } }
fn planet_name<'d>(p: NodeRef<'d>) -> Option<&'d str> {
    let name = p.child("name")?;
    let from_vars = name.child("variables").and_then(|vars| {
        vars.children()
            .find(|v| v.child("key").and_then(|k| k.value_unquoted()) == Some("NAME"))
            .and_then(|v| v.child("value"))
            .and_then(|v| v.child("key"))
            .and_then(|k| k.value_unquoted())
    });
    from_vars.or_else(|| name.child("key").and_then(|k| k.value_unquoted()))
}

pub fn summary_to_json_value(s: &SaveSummary) -> serde_json::Value {
    json!({
        "empireName": s.empire_name,
        "gameDate": s.game_date,
        "version": s.version,
        "ironman": s.ironman,
        "numPlanets": s.planets.len(),
        "planets": s.planets.iter().map(|p| json!({
            "id": p.id,
            "name": p.name,
            "type": p.class,
            "size": p.size,
        })).collect::<Vec<_>>(),
    })
}
