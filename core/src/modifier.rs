//! Wrapper views that change how their content is reconciled rather than what it looks like.

use crate::backend::Backend;
use crate::render::RenderNode;
use crate::scope::Scope;
use crate::view::{Body, View};
use core::any::Any;
use core::fmt;
use std::sync::Arc;

/// A callback that receives a render node.
pub type NodeHook<B> = Arc<dyn Fn(&mut RenderNode<B>)>;

/// Replaces a view by another one, or returns `None` to leave it alone.
pub type Rewrite<B> = Arc<dyn Fn(&dyn View<B>) -> Option<Arc<dyn View<B>>>>;

/// When a [`NodeHook`] runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookPhase {
    /// After the node was created.
    Appear,
    /// After every non-frozen update of an existing node.
    Update,
    /// Both of the above.
    Always,
}

impl HookPhase {
    pub(crate) fn on_create(self) -> bool {
        matches!(self, HookPhase::Appear | HookPhase::Always)
    }

    pub(crate) fn on_update(self) -> bool {
        matches!(self, HookPhase::Update | HookPhase::Always)
    }
}

/// What a built-in wrapper view does. Returned by [`View::modifier`].
pub enum Modifier<'a, B: Backend> {
    Freeze {
        content: &'a Arc<dyn View<B>>,
        frozen: bool,
    },
    Hook {
        content: &'a Arc<dyn View<B>>,
        phase: HookPhase,
        hook: &'a NodeHook<B>,
    },
    /// Adds a rewrite for everything inside `content`, widget children included.
    Rewrite {
        content: &'a Arc<dyn View<B>>,
        rewrite: &'a Rewrite<B>,
    },
    /// Drops every rewrite added further out.
    Stop { content: &'a Arc<dyn View<B>> },
}

/// See [`freeze`].
pub struct Freeze<B: Backend> {
    content: Arc<dyn View<B>>,
    frozen: bool,
}

impl<B: Backend> fmt::Debug for Freeze<B> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Freeze")
            .field("frozen", &self.frozen)
            .field("content", &self.content)
            .finish()
    }
}

impl<B: Backend> View<B> for Freeze<B> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn body(&self, _: &mut Scope<'_>) -> Body<B> {
        vec![Arc::clone(&self.content)]
    }

    fn modifier(&self) -> Option<Modifier<'_, B>> {
        Some(Modifier::Freeze {
            content: &self.content,
            frozen: self.frozen,
        })
    }
}

/// See [`inspect`], [`on_appear`] and [`on_update`].
pub struct Hooked<B: Backend> {
    content: Arc<dyn View<B>>,
    phase: HookPhase,
    hook: NodeHook<B>,
}

impl<B: Backend> fmt::Debug for Hooked<B> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Hooked")
            .field("phase", &self.phase)
            .field("content", &self.content)
            .finish()
    }
}

impl<B: Backend> View<B> for Hooked<B> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn body(&self, _: &mut Scope<'_>) -> Body<B> {
        vec![Arc::clone(&self.content)]
    }

    fn modifier(&self) -> Option<Modifier<'_, B>> {
        Some(Modifier::Hook {
            content: &self.content,
            phase: self.phase,
            hook: &self.hook,
        })
    }
}

/// Excludes the content from update passes while `frozen` is true.
///
/// The content is still created normally. While frozen, existing nodes keep their handles and
/// receive no property pushes, and their children are not visited at all.
pub fn freeze<B: Backend>(content: impl View<B>, frozen: bool) -> Freeze<B> {
    Freeze {
        content: Arc::new(content),
        frozen,
    }
}

/// Calls `f` with every node the content resolves to, after creation and after every update.
pub fn inspect<B: Backend>(
    content: impl View<B>,
    f: impl Fn(&mut RenderNode<B>) + 'static,
) -> Hooked<B> {
    Hooked {
        content: Arc::new(content),
        phase: HookPhase::Always,
        hook: Arc::new(f),
    }
}

/// Calls `f` once, when the content is first materialized.
pub fn on_appear<B: Backend>(
    content: impl View<B>,
    f: impl Fn(&mut RenderNode<B>) + 'static,
) -> Hooked<B> {
    Hooked {
        content: Arc::new(content),
        phase: HookPhase::Appear,
        hook: Arc::new(f),
    }
}

/// Calls `f` after every non-frozen update of the content (not after creation).
pub fn on_update<B: Backend>(
    content: impl View<B>,
    f: impl Fn(&mut RenderNode<B>) + 'static,
) -> Hooked<B> {
    Hooked {
        content: Arc::new(content),
        phase: HookPhase::Update,
        hook: Arc::new(f),
    }
}

/// See [`modify_content`].
pub struct ModifyContent<B: Backend> {
    content: Arc<dyn View<B>>,
    target: &'static str,
    rewrite: Rewrite<B>,
}

impl<B: Backend> fmt::Debug for ModifyContent<B> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ModifyContent")
            .field("target", &self.target)
            .field("content", &self.content)
            .finish()
    }
}

impl<B: Backend> View<B> for ModifyContent<B> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn body(&self, _: &mut Scope<'_>) -> Body<B> {
        vec![Arc::clone(&self.content)]
    }

    fn modifier(&self) -> Option<Modifier<'_, B>> {
        Some(Modifier::Rewrite {
            content: &self.content,
            rewrite: &self.rewrite,
        })
    }
}

/// See [`stop_modifiers`].
pub struct StopModifiers<B: Backend> {
    content: Arc<dyn View<B>>,
}

impl<B: Backend> fmt::Debug for StopModifiers<B> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("StopModifiers").field(&self.content).finish()
    }
}

impl<B: Backend> View<B> for StopModifiers<B> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn body(&self, _: &mut Scope<'_>) -> Body<B> {
        vec![Arc::clone(&self.content)]
    }

    fn modifier(&self) -> Option<Modifier<'_, B>> {
        Some(Modifier::Stop {
            content: &self.content,
        })
    }
}

/// Replaces every view of type `T` inside `content` with `f(view)`.
///
/// This reaches into the bodies of composites and into the child slots of widgets. The
/// replacement itself is not rewritten again, by this or any other enclosing
/// `modify_content`. If several enclosing rewrites target the same type, the outermost wins.
pub fn modify_content<B, T, V>(
    content: impl View<B>,
    f: impl Fn(&T) -> V + 'static,
) -> ModifyContent<B>
where
    B: Backend,
    T: View<B>,
    V: View<B>,
{
    let rewrite: Rewrite<B> = Arc::new(move |view: &dyn View<B>| {
        let view = view.as_any().downcast_ref::<T>()?;
        Some(Arc::new(f(view)) as Arc<dyn View<B>>)
    });
    ModifyContent {
        content: Arc::new(content),
        target: std::any::type_name::<T>(),
        rewrite,
    }
}

/// Shields `content` from every [`modify_content`] around it.
pub fn stop_modifiers<B: Backend>(content: impl View<B>) -> StopModifiers<B> {
    StopModifiers {
        content: Arc::new(content),
    }
}

/// See [`either`].
pub struct Either<B: Backend> {
    condition: bool,
    then: Arc<dyn View<B>>,
    otherwise: Arc<dyn View<B>>,
}

impl<B: Backend> fmt::Debug for Either<B> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Either")
            .field("condition", &self.condition)
            .field("then", &self.then)
            .field("otherwise", &self.otherwise)
            .finish()
    }
}

impl<B: Backend> View<B> for Either<B> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn body(&self, _: &mut Scope<'_>) -> Body<B> {
        if self.condition {
            vec![Arc::clone(&self.then)]
        } else {
            vec![Arc::clone(&self.otherwise)]
        }
    }
}

/// Expands to `then` if `condition` is true, and to `otherwise` if it isn’t.
///
/// Both branches occupy the same position, so switching between branches of different kinds
/// replaces the nodes.
pub fn either<B: Backend>(
    condition: bool,
    then: impl View<B>,
    otherwise: impl View<B>,
) -> Either<B> {
    Either {
        condition,
        then: Arc::new(then),
        otherwise: Arc::new(otherwise),
    }
}
