//! Environment map cache
//!
//! Environments are registered by URL, loaded on first use and kept by
//! display name. The cache also remembers which environment is active, the
//! one currently applied and whether it is shown as the background.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::{
    EnvironmentError, EnvironmentFormat, EnvironmentLoaders, EnvironmentMap, EnvironmentMapFactory,
    EnvironmentSceneFactory, EnvironmentSource, EnvironmentTexture,
};
use crate::assets::ImageData;
use crate::core::config::EnvironmentConfig;
use crate::foundation::collections::{InFlightLoads, KeyedCache};
use crate::render::{Color, Texture};

/// sRGB gray of the placeholder environment texture
const DEFAULT_ENVIRONMENT_GRAY: u32 = 0xc0_c0_c0;

/// Requested environment state
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SetEnvironmentParams {
    /// Show the environment as the scene background
    pub show_environment: bool,
    /// Rotation to apply, if any
    pub rotation: Option<f32>,
    /// Intensity to apply, if any
    pub intensity: Option<f32>,
}

type EnvironmentLoad = Result<EnvironmentTexture, EnvironmentError>;
type NamesObserver = Box<dyn Fn(&[String], &str)>;

#[derive(Default)]
struct NameList {
    names: Vec<String>,
    observer: Option<NamesObserver>,
}

/// Environment maps by display name
pub struct EnvironmentMapCache {
    default_name: String,
    loaders: EnvironmentLoaders,
    factory: EnvironmentMapFactory,
    default_texture: Rc<Texture>,
    resources: RefCell<Vec<(String, String)>>,
    environments: RefCell<KeyedCache<Rc<EnvironmentMap>>>,
    in_flight: RefCell<InFlightLoads<EnvironmentLoad>>,
    active: RefCell<String>,
    current: RefCell<Option<Rc<EnvironmentMap>>>,
    show_background: Cell<bool>,
    ui: RefCell<NameList>,
}

impl EnvironmentMapCache {
    /// Create a cache registering the resources listed in `config`
    pub fn new(config: &EnvironmentConfig, loaders: EnvironmentLoaders) -> Self {
        Self::with_factory(config, loaders, Box::new(EnvironmentMap::new))
    }

    /// Create a cache turning sources into maps with `factory`
    pub fn with_factory(
        config: &EnvironmentConfig,
        loaders: EnvironmentLoaders,
        factory: EnvironmentMapFactory,
    ) -> Self {
        let gray = Color::from_srgb_hex(DEFAULT_ENVIRONMENT_GRAY).to_rgba8();
        let cache = Self {
            default_name: config.default_name.clone(),
            loaders,
            factory,
            default_texture: Rc::new(Texture::new(ImageData::solid_color(1, 1, gray), None)),
            resources: RefCell::new(Vec::new()),
            environments: RefCell::new(KeyedCache::new()),
            in_flight: RefCell::new(InFlightLoads::new()),
            active: RefCell::new(String::new()),
            current: RefCell::new(None),
            show_background: Cell::new(false),
            ui: RefCell::new(NameList::default()),
        };
        cache.add_environment_resources(&config.resources);
        cache
    }

    /// Register resource URLs under their last path segment
    pub fn add_environment_resources<I, S>(&self, urls: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        {
            let mut resources = self.resources.borrow_mut();
            for url in urls {
                let url = url.as_ref();
                let name = url.rsplit('/').next().unwrap_or(url).to_string();
                log::debug!("Environment resource '{name}' -> {url}");
                match resources.iter_mut().find(|(known, _)| *known == name) {
                    Some(entry) => entry.1 = url.to_string(),
                    None => resources.push((name, url.to_string())),
                }
            }
        }
        self.refresh_names();
    }

    /// Register a procedural environment under `name`, or the default name
    ///
    /// With `change` set the new environment becomes the active one.
    pub fn load_default_environment(
        &self,
        change: bool,
        generator: Rc<dyn EnvironmentSceneFactory>,
        name: Option<&str>,
    ) {
        let name = name.unwrap_or(&self.default_name).to_string();
        let map = (self.factory)(EnvironmentSource::Procedural(generator));
        self.environments.borrow_mut().insert(name.as_str(), Rc::new(map));
        log::info!("Generated environment '{name}'");
        if change {
            self.select(&name);
        } else {
            self.refresh_names();
        }
    }

    /// Load the environment resource at `url` under `name`
    ///
    /// Returns `Ok(false)` without loading when the name has no recognised
    /// extension. Concurrent loads of one name share a single request.
    pub async fn load_from_resource(
        &self,
        name: &str,
        url: &str,
        change: bool,
    ) -> Result<bool, EnvironmentError> {
        let Some(format) = EnvironmentFormat::from_name(name) else {
            log::warn!("Unrecognised environment format: {name}");
            return Ok(false);
        };

        if !self.environments.borrow().contains(name) {
            let loader = self.loaders.for_format(format).clone();
            let target = url.to_string();
            let (load, started) = self.in_flight.borrow_mut().join_or_start(name, move || async move {
                EnvironmentLoad::Ok(loader.load(&target).await?)
            });
            if !started {
                log::debug!("Joining in-flight environment load of {name}");
            }

            let result = load.clone().await;
            self.in_flight.borrow_mut().finish(name, &load);
            let texture = result.map_err(|err| {
                log::warn!("Failed to load environment {name}: {err}");
                err
            })?;

            let mut environments = self.environments.borrow_mut();
            if !environments.contains(name) {
                let map = (self.factory)(EnvironmentSource::Texture(texture));
                environments.insert(name, Rc::new(map));
                log::info!("Loaded {format:?} environment '{name}' from {url}");
            }
        }

        if change {
            self.select(name);
        } else {
            self.refresh_names();
        }
        Ok(true)
    }

    /// Make `name` the active environment
    pub fn select(&self, name: &str) {
        *self.active.borrow_mut() = name.to_string();
        self.refresh_names();
    }

    /// Apply the active environment, loading a registered resource on first use
    ///
    /// Returns whether the applied environment is a different object than
    /// before.
    pub async fn set_environment(&self, params: SetEnvironmentParams) -> Result<bool, EnvironmentError> {
        let name = self.active_name();
        let pending = if self.environments.borrow().contains(&name) {
            None
        } else {
            self.resource_url(&name)
        };
        if let Some(url) = pending {
            self.load_from_resource(&name, &url, false).await?;
        }

        let environment = self.environments.borrow_mut().get(&name).cloned();
        let changed = match (self.current.borrow().as_ref(), environment.as_ref()) {
            (Some(previous), Some(next)) => !Rc::ptr_eq(previous, next),
            (None, None) => false,
            _ => true,
        };

        if let Some(map) = &environment {
            if let Some(rotation) = params.rotation {
                map.set_rotation(rotation);
            }
            if let Some(intensity) = params.intensity {
                map.set_intensity(intensity);
            }
        } else {
            log::debug!("No environment named '{name}'");
        }
        self.show_background.set(params.show_environment);
        *self.current.borrow_mut() = environment;
        self.refresh_names();
        Ok(changed)
    }

    /// Active name, falling back to the default name before any selection
    pub fn active_name(&self) -> String {
        let active = self.active.borrow();
        if active.is_empty() {
            self.default_name.clone()
        } else {
            active.clone()
        }
    }

    /// Environment applied by the last [`set_environment`](Self::set_environment)
    pub fn current_environment(&self) -> Option<Rc<EnvironmentMap>> {
        self.current.borrow().clone()
    }

    /// Whether the environment is shown as the background
    pub fn show_background(&self) -> bool {
        self.show_background.get()
    }

    /// 1×1 gray texture for materials that need an environment before one loads
    pub fn default_texture(&self) -> Rc<Texture> {
        Rc::clone(&self.default_texture)
    }

    /// Loaded environment named `name`
    pub fn get(&self, name: &str) -> Option<Rc<EnvironmentMap>> {
        self.environments.borrow().peek(name).cloned()
    }

    /// URL registered for `name`
    pub fn resource_url(&self, name: &str) -> Option<String> {
        self.resources
            .borrow()
            .iter()
            .find(|(known, _)| known == name)
            .map(|(_, url)| url.clone())
    }

    /// Names offered to the user: loaded ones first, then registered ones
    pub fn environment_names(&self) -> Vec<String> {
        self.ui.borrow().names.clone()
    }

    /// Watch the name list; `observer` gets the names and the active name
    pub fn set_names_observer(&self, observer: impl Fn(&[String], &str) + 'static) {
        self.ui.borrow_mut().observer = Some(Box::new(observer));
        self.rebuild_names();
    }

    fn refresh_names(&self) {
        let active = self.active_name();
        if !self.ui.borrow().names.contains(&active) {
            self.rebuild_names();
        }
    }

    fn rebuild_names(&self) {
        let mut names: Vec<String> = self.environments.borrow().keys().map(str::to_string).collect();
        for (name, _) in self.resources.borrow().iter() {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
        let active = self.active_name();
        let mut ui = self.ui.borrow_mut();
        ui.names = names;
        if let Some(observer) = &ui.observer {
            observer(&ui.names, &active);
        }
    }
}
