pub mod favorites;
pub mod quotes;
pub mod recommendations;
pub mod translate;

use quotes_kernel::{settings::Settings, ModuleRegistry};

use crate::services::Services;

/// Register every proxy module with the registry
pub fn register_all(registry: &mut ModuleRegistry, services: &Services, settings: &Settings) {
    registry.register(quotes::create_module(
        services.backend.clone(),
        &settings.quotes,
    ));
    registry.register(favorites::create_module(
        services.backend.clone(),
        services.identity.clone(),
    ));
    registry.register(recommendations::create_module(
        services.backend.clone(),
        services.identity.clone(),
    ));
    registry.register(translate::create_module(services.translator.clone()));
}
