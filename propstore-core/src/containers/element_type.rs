use nalgebra::Vector3;

use crate::layout::FloatType;

/// One named type of elements, e.g. a particle species or a bond type. Typed properties (such as
/// `ParticleProperty::Type`) store the numeric id of an `ElementType` per element
#[derive(Debug, Clone, PartialEq)]
pub struct ElementType {
    id: i32,
    name: String,
    color: Vector3<FloatType>,
    enabled: bool,
}

impl ElementType {
    /// Creates a new `ElementType` with a neutral gray color
    pub fn new<S: Into<String>>(id: i32, name: S) -> Self {
        Self {
            id,
            name: name.into(),
            color: Vector3::new(0.6, 0.6, 0.6),
            enabled: true,
        }
    }

    pub fn with_color(mut self, color: Vector3<FloatType>) -> Self {
        self.color = color;
        self
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn set_id(&mut self, id: i32) {
        self.id = id;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name<S: Into<String>>(&mut self, name: S) {
        self.name = name.into();
    }

    /// The name of this type, or `"Type <id>"` for unnamed types
    pub fn name_or_id(&self) -> String {
        if self.name.is_empty() {
            format!("Type {}", self.id)
        } else {
            self.name.clone()
        }
    }

    pub fn color(&self) -> Vector3<FloatType> {
        self.color
    }

    pub fn set_color(&mut self, color: Vector3<FloatType>) {
        self.color = color;
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}
