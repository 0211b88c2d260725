use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::coords::ColorRgba;

use super::{RenderCtx, RenderTarget, Renderable, Uniforms};

/// Something the `Renderer` can draw.
///
/// `prepare` runs for every visible item before the render pass opens (GPU
/// uploads happen there); `draw` records commands into the pass.
pub trait Drawable {
    fn uniforms_mut(&mut self) -> &mut Uniforms;

    fn prepare(&mut self, ctx: &RenderCtx<'_>, format: wgpu::TextureFormat);

    fn draw(&self, rpass: &mut wgpu::RenderPass<'_>);
}

/// Layered draw list.
///
/// Layers are visited in ascending order and items within a layer in
/// insertion order. Handles are `(index, layer)` pairs and stay valid for the
/// renderer's lifetime; disabling keeps the item in place.
pub struct Renderer<D: Drawable = Renderable> {
    layers: BTreeMap<i32, Vec<(Rc<RefCell<D>>, bool)>>,
}

impl<D: Drawable> Default for Renderer<D> {
    fn default() -> Self {
        Self { layers: BTreeMap::new() }
    }
}

impl<D: Drawable> Renderer<D> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an enabled item to `layer` and returns its index there.
    pub fn add_renderable(&mut self, item: Rc<RefCell<D>>, layer: i32) -> usize {
        let items = self.layers.entry(layer).or_default();
        items.push((item, true));
        items.len() - 1
    }

    pub fn enable(&mut self, index: usize, layer: i32) {
        if let Some(entry) = self.entry_mut(index, layer) {
            entry.1 = true;
        }
    }

    pub fn disable(&mut self, index: usize, layer: i32) {
        if let Some(entry) = self.entry_mut(index, layer) {
            entry.1 = false;
        }
    }

    pub fn is_enabled(&self, index: usize, layer: i32) -> Option<bool> {
        self.layers.get(&layer)?.get(index).map(|(_, on)| *on)
    }

    /// Runs `f` on the live uniform map of one item.
    pub fn update_uniform(&mut self, index: usize, f: impl FnOnce(&mut Uniforms), layer: i32) {
        if let Some((item, _)) = self.entry_mut(index, layer) {
            f(item.borrow_mut().uniforms_mut());
        }
    }

    pub fn get(&self, index: usize, layer: i32) -> Option<&Rc<RefCell<D>>> {
        self.layers.get(&layer)?.get(index).map(|(item, _)| item)
    }

    /// Number of items (enabled or not) in `layer`.
    pub fn layer_len(&self, layer: i32) -> usize {
        self.layers.get(&layer).map_or(0, Vec::len)
    }

    pub fn layers(&self) -> impl Iterator<Item = i32> + '_ {
        self.layers.keys().copied()
    }

    /// Enabled items in paint order as `(layer, index, item)`.
    pub fn visible(&self) -> impl Iterator<Item = (i32, usize, &Rc<RefCell<D>>)> + '_ {
        self.layers.iter().flat_map(|(&layer, items)| {
            items
                .iter()
                .enumerate()
                .filter(|(_, (_, on))| *on)
                .map(move |(index, (item, _))| (layer, index, item))
        })
    }

    /// Clears the target and draws every enabled item in one pass.
    pub fn render(&self, ctx: &RenderCtx<'_>, target: &mut RenderTarget<'_>, clear: ColorRgba) {
        for (_, _, item) in self.visible() {
            item.borrow_mut().prepare(ctx, target.format);
        }

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("pw renderer pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear.to_wgpu()),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        for (_, _, item) in self.visible() {
            item.borrow().draw(&mut rpass);
        }
    }

    fn entry_mut(&mut self, index: usize, layer: i32) -> Option<&mut (Rc<RefCell<D>>, bool)> {
        let entry = self.layers.get_mut(&layer).and_then(|items| items.get_mut(index));
        debug_assert!(entry.is_some(), "invalid renderable handle ({index}, layer {layer})");
        if entry.is_none() {
            log::error!("invalid renderable handle ({index}, layer {layer})");
        }
        entry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::Uniform;

    #[derive(Default)]
    struct Stub {
        uniforms: Uniforms,
    }

    impl Drawable for Stub {
        fn uniforms_mut(&mut self) -> &mut Uniforms {
            &mut self.uniforms
        }

        fn prepare(&mut self, _ctx: &RenderCtx<'_>, _format: wgpu::TextureFormat) {}

        fn draw(&self, _rpass: &mut wgpu::RenderPass<'_>) {}
    }

    fn stub() -> Rc<RefCell<Stub>> {
        Rc::new(RefCell::new(Stub::default()))
    }

    fn order(r: &Renderer<Stub>) -> Vec<(i32, usize)> {
        r.visible().map(|(layer, index, _)| (layer, index)).collect()
    }

    // ── ordering ──────────────────────────────────────────────────────────

    #[test]
    fn layers_visit_in_ascending_order() {
        let mut r = Renderer::new();
        r.add_renderable(stub(), 3);
        r.add_renderable(stub(), -1);
        r.add_renderable(stub(), 2);

        assert_eq!(r.layers().collect::<Vec<_>>(), vec![-1, 2, 3]);
        assert_eq!(order(&r), vec![(-1, 0), (2, 0), (3, 0)]);
    }

    #[test]
    fn indices_are_per_layer_insertion_order() {
        let mut r = Renderer::new();
        assert_eq!(r.add_renderable(stub(), 1), 0);
        assert_eq!(r.add_renderable(stub(), 1), 1);
        assert_eq!(r.add_renderable(stub(), 0), 0);
        assert_eq!(order(&r), vec![(0, 0), (1, 0), (1, 1)]);
    }

    // ── enable / disable ──────────────────────────────────────────────────

    #[test]
    fn disable_hides_without_removing() {
        let mut r = Renderer::new();
        let item = stub();
        let idx = r.add_renderable(Rc::clone(&item), 1);
        r.add_renderable(stub(), 1);

        r.disable(idx, 1);
        assert_eq!(order(&r), vec![(1, 1)]);
        assert_eq!(r.layer_len(1), 2);
        assert_eq!(r.is_enabled(idx, 1), Some(false));
        assert!(Rc::ptr_eq(r.get(idx, 1).expect("kept"), &item));

        r.enable(idx, 1);
        assert_eq!(order(&r), vec![(1, 0), (1, 1)]);
    }

    // ── uniforms ──────────────────────────────────────────────────────────

    #[test]
    fn update_uniform_mutates_in_place() {
        let mut r = Renderer::new();
        let item = stub();
        let idx = r.add_renderable(Rc::clone(&item), 4);

        r.update_uniform(idx, |u| {
            u.insert("u_time".to_owned(), Uniform::Float(0.5));
        }, 4);

        assert_eq!(item.borrow().uniforms.get("u_time"), Some(&Uniform::Float(0.5)));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "invalid renderable handle")]
    fn invalid_handle_asserts_in_debug() {
        let mut r: Renderer<Stub> = Renderer::new();
        r.disable(0, 7);
    }
}
