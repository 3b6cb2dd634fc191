//! The active scene graph and the draggable set.

use wgpu::Device;

use super::object::Object;

/// Stable handle to an object in the registry's arena.
///
/// Handles are never invalidated: the arena is append-only for the lifetime
/// of a stage, and there is deliberately no removal operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModelId(usize);

impl ModelId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Owns every object in the active scene plus the subset eligible for
/// pointer dragging.
///
/// The draggable set holds handles into the arena, so set membership always
/// implies graph membership: the only way into the set is through
/// [`SceneRegistry::add_model`] or [`SceneRegistry::make_draggable`], both of
/// which start from a handle this registry issued, and nothing is ever
/// removed from the arena.
pub struct SceneRegistry {
    objects: Vec<Object>,
    draggable: Vec<ModelId>,
}

impl SceneRegistry {
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
            draggable: Vec::new(),
        }
    }

    /// Inserts an object into the scene graph without making it draggable
    /// (room fixtures such as the floor).
    pub fn insert(&mut self, object: Object) -> ModelId {
        let id = ModelId(self.objects.len());
        self.objects.push(object);
        id
    }

    /// Inserts an imported model and registers it for dragging.
    pub fn add_model(&mut self, object: Object) -> ModelId {
        let id = self.insert(object);
        self.make_draggable(id);
        id
    }

    /// Adds `id` to the draggable set. Idempotent: a handle already in the
    /// set is left alone, and a handle this registry never issued is
    /// rejected. Returns whether the set grew.
    pub fn make_draggable(&mut self, id: ModelId) -> bool {
        if id.0 >= self.objects.len() {
            log::warn!("ignoring unknown model handle {:?}", id);
            return false;
        }
        if self.draggable.contains(&id) {
            return false;
        }
        self.draggable.push(id);
        true
    }

    /// The live draggable set, in insertion order.
    pub fn current_draggables(&self) -> &[ModelId] {
        &self.draggable
    }

    pub fn contains(&self, id: ModelId) -> bool {
        id.0 < self.objects.len()
    }

    pub fn object(&self, id: ModelId) -> Option<&Object> {
        self.objects.get(id.0)
    }

    pub fn object_mut(&mut self, id: ModelId) -> Option<&mut Object> {
        self.objects.get_mut(id.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ModelId, &Object)> {
        self.objects
            .iter()
            .enumerate()
            .map(|(i, object)| (ModelId(i), object))
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Appends ` (n)` until `desired` no longer collides with an existing
    /// object name.
    pub fn ensure_unique_name(&self, desired: &str) -> String {
        let mut counter = 0;
        let mut candidate = desired.to_string();
        while self.objects.iter().any(|object| object.name == candidate) {
            counter += 1;
            candidate = format!("{} ({})", desired, counter);
        }
        candidate
    }

    /// Uploads GPU state for objects that joined since the last call.
    pub fn init_gpu_resources(&mut self, device: &Device, layout: &wgpu::BindGroupLayout) {
        for object in &mut self.objects {
            if !object.has_gpu_resources() {
                object.init_gpu_resources(device, layout);
            }
        }
    }

    /// Flushes dirty transforms to the GPU.
    pub fn update_transforms(&mut self, queue: &wgpu::Queue) {
        for object in &mut self.objects {
            object.update_transform(queue);
        }
    }
}

impl Default for SceneRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::super::object::Mesh;
    use super::*;

    fn model(name: &str) -> Object {
        Object::new(
            name,
            vec![Mesh::new(
                vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
                vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0],
                vec![0, 1, 2],
            )],
        )
    }

    #[test]
    fn test_added_model_is_in_graph_and_draggable_set() {
        let mut registry = SceneRegistry::new();
        let id = registry.add_model(model("chair"));
        assert!(registry.contains(id));
        assert_eq!(registry.current_draggables(), &[id]);
    }

    #[test]
    fn test_fixtures_join_graph_without_draggability() {
        let mut registry = SceneRegistry::new();
        let floor = registry.insert(model("floor"));
        let chair = registry.add_model(model("chair"));
        assert!(registry.contains(floor));
        assert_eq!(registry.current_draggables(), &[chair]);
    }

    #[test]
    fn test_make_draggable_is_idempotent() {
        let mut registry = SceneRegistry::new();
        let id = registry.add_model(model("chair"));
        assert!(!registry.make_draggable(id));
        assert_eq!(registry.current_draggables().len(), 1);
    }

    #[test]
    fn test_unknown_handles_are_rejected() {
        let mut registry = SceneRegistry::new();
        registry.insert(model("floor"));
        assert!(!registry.make_draggable(ModelId(99)));
        assert!(registry.current_draggables().is_empty());
    }

    #[test]
    fn test_draggable_order_follows_insertion() {
        let mut registry = SceneRegistry::new();
        let a = registry.add_model(model("a"));
        let b = registry.add_model(model("b"));
        let c = registry.add_model(model("c"));
        assert_eq!(registry.current_draggables(), &[a, b, c]);
    }

    #[test]
    fn test_names_are_deduplicated() {
        let mut registry = SceneRegistry::new();
        registry.add_model(model("chair"));
        assert_eq!(registry.ensure_unique_name("chair"), "chair (1)");
        assert_eq!(registry.ensure_unique_name("table"), "table");
    }
}
