//! Render hooks.
//!
//! Hooks observe a render pass: once before it starts, after every
//! top-level layer and once after it ends. They run in registration order;
//! an error from any hook aborts the pass.

use crate::layer::Layer;
use crate::scene::Scene;
use common::error::SceneResult;
use surface::DrawingSurface;

/// Observer of render passes.
pub trait RenderHook {
    fn name(&self) -> &str;

    fn before_render(&mut self, _scene: &Scene) -> SceneResult<()> {
        Ok(())
    }

    fn after_layer(&mut self, _layer: &Layer, _surface: &dyn DrawingSurface) -> SceneResult<()> {
        Ok(())
    }

    fn after_render(&mut self, _scene: &Scene, _surface: &dyn DrawingSurface) -> SceneResult<()> {
        Ok(())
    }
}

/// Hooks passed to a renderer.
#[derive(Default)]
pub struct HookRegistry {
    hooks: Vec<Box<dyn RenderHook>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, hook: Box<dyn RenderHook>) {
        tracing::debug!(hook = hook.name(), "render hook registered");
        self.hooks.push(hook);
    }

    pub fn with_hook(mut self, hook: Box<dyn RenderHook>) -> Self {
        self.register(hook);
        self
    }

    /// Remove every hook called `name`.
    pub fn unregister(&mut self, name: &str) {
        self.hooks.retain(|hook| hook.name() != name);
    }

    pub fn names(&self) -> Vec<&str> {
        self.hooks.iter().map(|hook| hook.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    pub(crate) fn before_render(&mut self, scene: &Scene) -> SceneResult<()> {
        self.hooks.iter_mut().try_for_each(|hook| hook.before_render(scene))
    }

    pub(crate) fn after_layer(&mut self, layer: &Layer, surface: &dyn DrawingSurface) -> SceneResult<()> {
        self.hooks.iter_mut().try_for_each(|hook| hook.after_layer(layer, surface))
    }

    pub(crate) fn after_render(&mut self, scene: &Scene, surface: &dyn DrawingSurface) -> SceneResult<()> {
        self.hooks.iter_mut().try_for_each(|hook| hook.after_render(scene, surface))
    }
}

impl std::fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookRegistry").field("hooks", &self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named(&'static str);

    impl RenderHook for Named {
        fn name(&self) -> &str {
            self.0
        }
    }

    #[test]
    fn test_register_and_unregister() {
        let mut hooks = HookRegistry::new()
            .with_hook(Box::new(Named("a")))
            .with_hook(Box::new(Named("b")));
        assert_eq!(hooks.names(), vec!["a", "b"]);
        hooks.unregister("a");
        assert_eq!(hooks.names(), vec!["b"]);
        assert_eq!(hooks.len(), 1);
    }
}
