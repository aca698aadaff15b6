//! Textures and shared texture slots
//!
//! A [`TextureHandle`] is the update channel between a material and the
//! asynchronous load that fills one of its texture slots. The material keeps
//! the handle; the owner of the scene decides whether and when to drive the
//! load returned by [`TextureHandle::load_task`]. Every state change is pushed
//! to the handle's observers.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use futures::future::{FutureExt, LocalBoxFuture};

use crate::assets::texture_loader::TextureLoader;
use crate::assets::ImageData;
use crate::foundation::math::Vec2;

/// Texture wrapping modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WrapMode {
    /// Repeat the texture
    Repeat,
    /// Clamp to edge
    #[default]
    ClampToEdge,
}

/// Sampling parameters applied to a texture when it lands in a slot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureSampling {
    /// Wrapping in U and V
    pub wrap: WrapMode,
    /// UV repeat factors
    pub repeat: Vec2,
    /// Anisotropic filtering level
    pub anisotropy: u16,
}

impl Default for TextureSampling {
    fn default() -> Self {
        Self {
            wrap: WrapMode::ClampToEdge,
            repeat: Vec2::new(1.0, 1.0),
            anisotropy: 1,
        }
    }
}

/// Renderer texture
#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    /// Decoded pixels
    pub image: ImageData,
    /// URL the pixels came from, if any
    pub source: Option<String>,
    /// Sampling parameters
    pub sampling: TextureSampling,
}

impl Texture {
    /// Wrap decoded pixels with default sampling
    pub fn new(image: ImageData, source: Option<String>) -> Self {
        Self {
            image,
            source,
            sampling: TextureSampling::default(),
        }
    }
}

/// Lifecycle of a texture slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureStatus {
    /// Load requested, nothing to show yet
    Pending,
    /// A synthesized stand-in is showing
    Placeholder,
    /// The real texture arrived
    Loaded,
    /// The load failed; any placeholder stays in place
    Failed,
}

/// What a slot should load and how it samples
#[derive(Debug, Clone, PartialEq)]
pub struct TextureBinding {
    /// Resource to fetch
    pub url: Option<String>,
    /// Sampling applied to whatever texture lands in the slot
    pub sampling: TextureSampling,
}

type TextureObserver = Rc<dyn Fn(TextureStatus, &Rc<Texture>)>;

struct SlotState {
    status: TextureStatus,
    texture: Option<Rc<Texture>>,
}

struct TextureSlot {
    binding: TextureBinding,
    state: RefCell<SlotState>,
    observers: RefCell<Vec<TextureObserver>>,
}

/// Shared, observable texture slot
#[derive(Clone)]
pub struct TextureHandle {
    slot: Rc<TextureSlot>,
}

impl TextureHandle {
    /// Create a pending slot for `binding`
    pub fn new(binding: TextureBinding) -> Self {
        Self {
            slot: Rc::new(TextureSlot {
                binding,
                state: RefCell::new(SlotState {
                    status: TextureStatus::Pending,
                    texture: None,
                }),
                observers: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Binding this slot was created for
    pub fn binding(&self) -> &TextureBinding {
        &self.slot.binding
    }

    /// Current status
    pub fn status(&self) -> TextureStatus {
        self.slot.state.borrow().status
    }

    /// Texture currently showing in the slot
    pub fn current(&self) -> Option<Rc<Texture>> {
        self.slot.state.borrow().texture.clone()
    }

    /// Whether two handles are the same slot
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.slot, &b.slot)
    }

    /// Register a callback fired on every texture update of this slot
    pub fn subscribe(&self, observer: impl Fn(TextureStatus, &Rc<Texture>) + 'static) {
        self.slot.observers.borrow_mut().push(Rc::new(observer));
    }

    /// Show a stand-in texture until the real one arrives
    pub fn install_placeholder(&self, texture: Texture) {
        self.install(TextureStatus::Placeholder, texture);
    }

    /// Show the loaded texture
    pub fn install_loaded(&self, texture: Texture) {
        self.install(TextureStatus::Loaded, texture);
    }

    /// Record a failed load; the current texture, if any, keeps showing
    pub fn mark_failed(&self) {
        self.slot.state.borrow_mut().status = TextureStatus::Failed;
    }

    fn install(&self, status: TextureStatus, mut texture: Texture) {
        texture.sampling = self.slot.binding.sampling;
        let texture = Rc::new(texture);
        {
            let mut state = self.slot.state.borrow_mut();
            state.status = status;
            state.texture = Some(Rc::clone(&texture));
        }
        let observers: Vec<TextureObserver> = self.slot.observers.borrow().clone();
        for observer in observers {
            observer(status, &texture);
        }
    }

    /// Future that fetches this slot's texture with `loader` and installs it
    ///
    /// Returns `None` when the binding has no URL.
    pub fn load_task(&self, loader: Rc<dyn TextureLoader>) -> Option<LocalBoxFuture<'static, ()>> {
        let url = self.slot.binding.url.clone()?;
        let handle = self.clone();
        Some(
            async move {
                match loader.load(&url).await {
                    Ok(texture) => handle.install_loaded(texture),
                    Err(err) => {
                        log::warn!("Texture load failed for {url}: {err}");
                        handle.mark_failed();
                    }
                }
            }
            .boxed_local(),
        )
    }
}

impl PartialEq for TextureHandle {
    fn eq(&self, other: &Self) -> bool {
        Self::ptr_eq(self, other)
            || (self.binding() == other.binding() && self.status() == other.status())
    }
}

impl fmt::Debug for TextureHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextureHandle")
            .field("url", &self.slot.binding.url)
            .field("status", &self.status())
            .finish()
    }
}

/// Batch of texture loads produced while building a scene
///
/// Nothing runs until the owner awaits [`TextureLoads::run`] or spawns the
/// individual tasks on an executor of its choice.
#[derive(Default)]
pub struct TextureLoads {
    tasks: Vec<LocalBoxFuture<'static, ()>>,
}

impl TextureLoads {
    /// Create an empty batch
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one load
    pub fn push(&mut self, task: LocalBoxFuture<'static, ()>) {
        self.tasks.push(task);
    }

    /// Move every load of `other` into this batch
    pub fn append(&mut self, mut other: TextureLoads) {
        self.tasks.append(&mut other.tasks);
    }

    /// Number of pending loads
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether the batch is empty
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Hand out the individual tasks
    pub fn into_tasks(self) -> Vec<LocalBoxFuture<'static, ()>> {
        self.tasks
    }

    /// Drive every load to completion
    pub async fn run(self) {
        futures::future::join_all(self.tasks).await;
    }
}

impl fmt::Debug for TextureLoads {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextureLoads").field("pending", &self.tasks.len()).finish()
    }
}
