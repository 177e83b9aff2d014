use std::collections::BTreeMap;
use std::path::Path;
use std::rc::Rc;

use anyhow::{Context, bail};
use glam::Vec3;
use pinpoint_anchor::{AnchorOptions, AnchorSource};
use pinpoint_common::{EntityId, Handedness, Transform, Viewport};
use pinpoint_input::InputConfig;
use pinpoint_scene::{CameraKind, FlyCamera, Scene};
use serde::{Deserialize, Serialize};

/// Scene description loaded by the CLI. Every field has a default.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub handedness: Handedness,
    pub viewport: Viewport,
    pub camera: CameraConfig,
    pub input: InputConfig,
    pub entities: Vec<EntityConfig>,
    pub anchors: Vec<AnchorConfig>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub rig: FlyCamera,
    /// Overrides the rig's yaw and pitch.
    pub look_at: Option<Vec3>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityConfig {
    pub name: String,
    pub position: Vec3,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorTarget {
    Point(Vec3),
    /// Name of an entry in `entities`.
    Entity(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchorConfig {
    pub label: String,
    pub target: AnchorTarget,
    #[serde(default)]
    pub options: AnchorOptions,
}

/// Scene built from a config, plus the ids its named entities received.
pub struct LoadedScene {
    pub scene: Rc<Scene>,
    pub entities: BTreeMap<String, EntityId>,
}

impl LoadedScene {
    pub fn anchor_source(&self, target: &AnchorTarget) -> anyhow::Result<AnchorSource> {
        match target {
            AnchorTarget::Point(p) => Ok(AnchorSource::Point(*p)),
            AnchorTarget::Entity(name) => self
                .entities
                .get(name)
                .map(|id| AnchorSource::Entity(*id))
                .with_context(|| format!("anchor refers to unknown entity `{name}`")),
        }
    }
}

impl SceneConfig {
    /// Load from YAML (`.yaml`/`.yml`) or JSON (`.json`).
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        let config = match ext.as_deref() {
            Some("yaml" | "yml") => serde_yaml::from_str(&data)
                .with_context(|| format!("parsing {}", path.display()))?,
            Some("json") => serde_json::from_str(&data)
                .with_context(|| format!("parsing {}", path.display()))?,
            _ => bail!("unsupported config format: {}", path.display()),
        };
        tracing::debug!(path = %path.display(), "loaded scene config");
        Ok(config)
    }

    pub fn build(&self) -> anyhow::Result<LoadedScene> {
        let scene = Rc::new(Scene::new(self.handedness, self.viewport));
        let mut rig = self.camera.rig.clone();
        if let Some(target) = self.camera.look_at {
            rig.look_at(target);
        }
        scene.add_camera(CameraKind::Free, rig);

        let mut entities = BTreeMap::new();
        for entity in &self.entities {
            let id = scene.spawn_entity(Transform::from_position(entity.position));
            if entities.insert(entity.name.clone(), id).is_some() {
                bail!("duplicate entity name `{}`", entity.name);
            }
        }
        Ok(LoadedScene { scene, entities })
    }
}
