//! Pointer dragging of scene objects.
//!
//! Converts a mouse press into a world-space ray, tests it against the
//! draggable set's bounding boxes, and while the button is held translates
//! the grabbed object along a camera-facing plane through the grab point.
//! Gesture boundaries are reported as [`DragEvent`]s for the interaction
//! mediator; this module never touches the orbit-enabled flag itself.

use cgmath::{ElementWise, InnerSpace, Matrix4, SquareMatrix, Vector3, Vector4, Zero};
use winit::event::{ElementState, MouseButton, WindowEvent};

use crate::gfx::camera::orbit_camera::OrbitCamera;
use crate::gfx::scene::{ModelId, SceneRegistry};

/// A world-space ray for intersection testing.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Vector3<f32>,
    pub direction: Vector3<f32>,
}

impl Ray {
    pub fn new(origin: Vector3<f32>, direction: Vector3<f32>) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    pub fn point_at(&self, t: f32) -> Vector3<f32> {
        self.origin + self.direction * t
    }

    /// Distance along the ray to the plane through `point` with `normal`,
    /// or `None` when the ray is parallel to it or the plane is behind.
    pub fn intersect_plane(&self, point: Vector3<f32>, normal: Vector3<f32>) -> Option<f32> {
        let denom = self.direction.dot(normal);
        if denom.abs() < 1e-6 {
            return None;
        }
        let t = (point - self.origin).dot(normal) / denom;
        (t >= 0.0).then_some(t)
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy)]
pub struct Aabb {
    pub min: Vector3<f32>,
    pub max: Vector3<f32>,
}

impl Aabb {
    pub fn new(min: Vector3<f32>, max: Vector3<f32>) -> Self {
        Self { min, max }
    }

    pub fn from_vertices(vertices: &[[f32; 3]]) -> Self {
        if vertices.is_empty() {
            return Self::new(Vector3::zero(), Vector3::zero());
        }

        let mut min = Vector3::new(vertices[0][0], vertices[0][1], vertices[0][2]);
        let mut max = min;
        for vertex in vertices.iter().skip(1) {
            let v = Vector3::new(vertex[0], vertex[1], vertex[2]);
            min.x = min.x.min(v.x);
            min.y = min.y.min(v.y);
            min.z = min.z.min(v.z);
            max.x = max.x.max(v.x);
            max.y = max.y.max(v.y);
            max.z = max.z.max(v.z);
        }
        Self::new(min, max)
    }

    /// Slab test. Returns the entry distance, or the exit distance when the
    /// ray starts inside the box.
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f32> {
        let inv_dir = Vector3::new(
            1.0 / ray.direction.x,
            1.0 / ray.direction.y,
            1.0 / ray.direction.z,
        );

        let t_min = (self.min - ray.origin).mul_element_wise(inv_dir);
        let t_max = (self.max - ray.origin).mul_element_wise(inv_dir);

        let t1 = Vector3::new(
            t_min.x.min(t_max.x),
            t_min.y.min(t_max.y),
            t_min.z.min(t_max.z),
        );
        let t2 = Vector3::new(
            t_min.x.max(t_max.x),
            t_min.y.max(t_max.y),
            t_min.z.max(t_max.z),
        );

        let t_near = t1.x.max(t1.y.max(t1.z));
        let t_far = t2.x.min(t2.y.min(t2.z));

        if t_near <= t_far && t_far >= 0.0 {
            Some(if t_near >= 0.0 { t_near } else { t_far })
        } else {
            None
        }
    }

    /// Recomputes the box around the eight transformed corners.
    pub fn transform(&self, matrix: &Matrix4<f32>) -> Self {
        let corners = [
            Vector3::new(self.min.x, self.min.y, self.min.z),
            Vector3::new(self.max.x, self.min.y, self.min.z),
            Vector3::new(self.min.x, self.max.y, self.min.z),
            Vector3::new(self.min.x, self.min.y, self.max.z),
            Vector3::new(self.max.x, self.max.y, self.min.z),
            Vector3::new(self.max.x, self.min.y, self.max.z),
            Vector3::new(self.min.x, self.max.y, self.max.z),
            Vector3::new(self.max.x, self.max.y, self.max.z),
        ];

        let mut transformed = Vec::with_capacity(8);
        for corner in &corners {
            let h = matrix * Vector4::new(corner.x, corner.y, corner.z, 1.0);
            transformed.push([h.x / h.w, h.y / h.w, h.z / h.w]);
        }
        Self::from_vertices(&transformed)
    }
}

/// Gesture boundary notifications for the interaction mediator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragEvent {
    Started(ModelId),
    Ended(ModelId),
}

struct ActiveDrag {
    id: ModelId,
    plane_point: Vector3<f32>,
    plane_normal: Vector3<f32>,
    grab_offset: Vector3<f32>,
}

/// Drag-gesture detection and object translation over the draggable set.
pub struct DragControls {
    active: Option<ActiveDrag>,
    cached_bounds: Vec<Option<Aabb>>,
    cursor: Option<(f32, f32)>,
}

impl DragControls {
    pub fn new() -> Self {
        Self {
            active: None,
            cached_bounds: Vec::new(),
            cursor: None,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.active.is_some()
    }

    /// Routes a window event through the drag gesture machine. Returns the
    /// gesture boundary it produced, if any.
    pub fn process_window_event(
        &mut self,
        event: &WindowEvent,
        viewport: (f32, f32),
        camera: &OrbitCamera,
        registry: &mut SceneRegistry,
    ) -> Option<DragEvent> {
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = Some((position.x as f32, position.y as f32));
                self.update_drag(viewport, camera, registry);
                None
            }
            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state: ElementState::Pressed,
                ..
            } => self.begin_drag(viewport, camera, registry),
            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state: ElementState::Released,
                ..
            } => self.end_drag(),
            _ => None,
        }
    }

    /// Attempts to start a gesture at the last known cursor position.
    pub fn begin_drag(
        &mut self,
        viewport: (f32, f32),
        camera: &OrbitCamera,
        registry: &SceneRegistry,
    ) -> Option<DragEvent> {
        if self.active.is_some() {
            return None;
        }
        let cursor = self.cursor?;
        let ray = screen_to_ray(cursor, viewport, camera);
        let (id, hit) = self.pick(&ray, registry)?;

        let object = registry.object(id)?;
        let plane_normal = (camera.target - camera.eye).normalize();
        self.active = Some(ActiveDrag {
            id,
            plane_point: hit,
            plane_normal,
            grab_offset: hit - object.translation(),
        });
        log::debug!("drag started on `{}`", object.name);
        Some(DragEvent::Started(id))
    }

    /// Moves the grabbed object to the cursor's intersection with the drag
    /// plane.
    pub fn update_drag(
        &mut self,
        viewport: (f32, f32),
        camera: &OrbitCamera,
        registry: &mut SceneRegistry,
    ) {
        let Some(active) = &self.active else {
            return;
        };
        let Some(cursor) = self.cursor else {
            return;
        };

        let ray = screen_to_ray(cursor, viewport, camera);
        if let Some(t) = ray.intersect_plane(active.plane_point, active.plane_normal) {
            let hit = ray.point_at(t);
            if let Some(object) = registry.object_mut(active.id) {
                object.set_translation(hit - active.grab_offset);
            }
        }
    }

    /// Ends the active gesture, if any.
    pub fn end_drag(&mut self) -> Option<DragEvent> {
        self.active.take().map(|drag| DragEvent::Ended(drag.id))
    }

    /// Closest draggable object hit by `ray`, with the world-space hit point.
    fn pick(&mut self, ray: &Ray, registry: &SceneRegistry) -> Option<(ModelId, Vector3<f32>)> {
        let mut closest: Option<(ModelId, f32)> = None;

        for &id in registry.current_draggables() {
            let Some(object) = registry.object(id) else {
                continue;
            };
            if !object.visible {
                continue;
            }

            let local = self.local_bounds(id, registry);
            let world = local.transform(&object.transform);
            if let Some(distance) = world.intersect_ray(ray) {
                if closest.map_or(true, |(_, best)| distance < best) {
                    closest = Some((id, distance));
                }
            }
        }

        closest.map(|(id, distance)| (id, ray.point_at(distance)))
    }

    fn local_bounds(&mut self, id: ModelId, registry: &SceneRegistry) -> Aabb {
        while self.cached_bounds.len() <= id.index() {
            self.cached_bounds.push(None);
        }
        if let Some(cached) = self.cached_bounds[id.index()] {
            return cached;
        }

        let mut vertices = Vec::new();
        if let Some(object) = registry.object(id) {
            for mesh in &object.meshes {
                for vertex in mesh.vertices() {
                    vertices.push(vertex.position);
                }
            }
        }
        let bounds = if vertices.is_empty() {
            Aabb::new(Vector3::new(-0.5, -0.5, -0.5), Vector3::new(0.5, 0.5, 0.5))
        } else {
            Aabb::from_vertices(&vertices)
        };
        self.cached_bounds[id.index()] = Some(bounds);
        bounds
    }
}

impl Default for DragControls {
    fn default() -> Self {
        Self::new()
    }
}

/// Converts a cursor position to a world-space ray through the scene.
pub fn screen_to_ray(cursor: (f32, f32), viewport: (f32, f32), camera: &OrbitCamera) -> Ray {
    let ndc_x = (2.0 * cursor.0) / viewport.0 - 1.0;
    let ndc_y = 1.0 - (2.0 * cursor.1) / viewport.1;

    let eye = cgmath::Point3::from_vec(camera.eye);
    let target = cgmath::Point3::from_vec(camera.target);
    let view = Matrix4::look_at_rh(eye, target, camera.up);
    let proj = cgmath::perspective(camera.fovy, camera.aspect, camera.znear, camera.zfar);
    let inv_view_proj = (proj * view).invert().unwrap_or(Matrix4::from_scale(1.0));

    let near = inv_view_proj * Vector4::new(ndc_x, ndc_y, -1.0, 1.0);
    let far = inv_view_proj * Vector4::new(ndc_x, ndc_y, 1.0, 1.0);

    let near = Vector3::new(near.x / near.w, near.y / near.w, near.z / near.w);
    let far = Vector3::new(far.x / far.w, far.y / far.w, far.z / far.w);

    Ray::new(near, far - near)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::scene::{Mesh, Object};

    fn cube_object(name: &str) -> Object {
        // Unit cube as two-triangle faces is overkill for bounds tests; a
        // tetrahedral point cloud spanning [-0.5, 0.5] is enough.
        let positions = vec![
            -0.5, -0.5, -0.5, //
            0.5, -0.5, -0.5, //
            0.0, 0.5, 0.0, //
            0.0, 0.0, 0.5,
        ];
        let normals = vec![0.0; positions.len()];
        Object::new(name, vec![Mesh::new(positions, normals, vec![0, 1, 2])])
    }

    fn test_camera() -> OrbitCamera {
        // Eye on +Z looking at the origin.
        OrbitCamera::new(5.0, 0.0, 0.0, Vector3::zero(), 1.0)
    }

    #[test]
    fn test_ray_hits_box_in_front() {
        let ray = Ray::new(Vector3::new(0.0, 0.0, 5.0), Vector3::new(0.0, 0.0, -1.0));
        let aabb = Aabb::new(Vector3::new(-1.0, -1.0, -1.0), Vector3::new(1.0, 1.0, 1.0));
        let t = aabb.intersect_ray(&ray).expect("should hit");
        assert!((t - 4.0).abs() < 1e-5);
    }

    #[test]
    fn test_ray_misses_box_behind() {
        let ray = Ray::new(Vector3::new(0.0, 0.0, 5.0), Vector3::new(0.0, 0.0, 1.0));
        let aabb = Aabb::new(Vector3::new(-1.0, -1.0, -1.0), Vector3::new(1.0, 1.0, 1.0));
        assert!(aabb.intersect_ray(&ray).is_none());
    }

    #[test]
    fn test_transformed_bounds_follow_translation() {
        let aabb = Aabb::new(Vector3::new(-1.0, -1.0, -1.0), Vector3::new(1.0, 1.0, 1.0));
        let moved = aabb.transform(&Matrix4::from_translation(Vector3::new(10.0, 0.0, 0.0)));
        assert!((moved.min.x - 9.0).abs() < 1e-5);
        assert!((moved.max.x - 11.0).abs() < 1e-5);
    }

    #[test]
    fn test_center_cursor_ray_points_at_target() {
        let camera = test_camera();
        let ray = screen_to_ray((400.0, 300.0), (800.0, 600.0), &camera);
        let toward_target = (camera.target - camera.eye).normalize();
        assert!(ray.direction.dot(toward_target) > 0.999);
    }

    #[test]
    fn test_drag_gesture_moves_object_and_reports_boundaries() {
        let mut registry = SceneRegistry::new();
        let id = registry.add_model(cube_object("chair"));
        let camera = test_camera();
        let viewport = (800.0, 600.0);
        let mut drag = DragControls::new();

        // Press at the center: the object sits at the origin, dead ahead.
        drag.cursor = Some((400.0, 300.0));
        let started = drag.begin_drag(viewport, &camera, &registry);
        assert_eq!(started, Some(DragEvent::Started(id)));
        assert!(drag.is_dragging());

        // Move the cursor right; the object should follow on the drag plane.
        drag.cursor = Some((500.0, 300.0));
        drag.update_drag(viewport, &camera, &mut registry);
        let moved = registry.object(id).unwrap().translation();
        assert!(moved.x > 0.01, "object should have moved right, got {:?}", moved);
        assert!(moved.z.abs() < 0.2, "camera-facing plane keeps depth stable");

        assert_eq!(drag.end_drag(), Some(DragEvent::Ended(id)));
        assert!(!drag.is_dragging());
    }

    #[test]
    fn test_press_on_empty_space_starts_nothing() {
        let mut registry = SceneRegistry::new();
        registry.add_model(cube_object("chair"));
        let camera = test_camera();
        let mut drag = DragControls::new();

        drag.cursor = Some((5.0, 5.0)); // far corner, no object there
        assert!(drag
            .begin_drag((800.0, 600.0), &camera, &registry)
            .is_none());
        assert!(!drag.is_dragging());
    }

    #[test]
    fn test_non_draggable_fixtures_are_ignored() {
        let mut registry = SceneRegistry::new();
        registry.insert(cube_object("floor"));
        let camera = test_camera();
        let mut drag = DragControls::new();

        drag.cursor = Some((400.0, 300.0));
        assert!(drag
            .begin_drag((800.0, 600.0), &camera, &registry)
            .is_none());
    }
}
