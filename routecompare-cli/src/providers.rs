//! Provider credentials and comparator construction shared by the
//! `compare` and `single` commands.

use std::sync::Arc;

use camino::Utf8PathBuf;
use routecompare_core::{Comparator, ProviderKind, ProviderSet, RouteProvider};
use routecompare_data::routing::OSRM_DEMO_URL;
use routecompare_data::{
    DEFAULT_USAGE_FILE, DailyUsageCounter, GoogleDirections, GraphHopperRouting, HereRouting,
    OpenDataBackend, OsrmRouting, OsrmSnapper, ProviderBuildError,
};

use crate::{ARG_GOOGLE_API_KEY, ARG_GRAPHHOPPER_API_KEY, ARG_HERE_API_KEY, CliError};

/// Environment variables naming each credential for one subcommand.
#[derive(Debug, Clone, Copy)]
pub(crate) struct CredentialEnv {
    pub(crate) google_api_key: &'static str,
    pub(crate) here_api_key: &'static str,
    pub(crate) graphhopper_api_key: &'static str,
}

/// Raw provider flags after configuration merging.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ProviderFlags {
    pub(crate) google_api_key: Option<String>,
    pub(crate) here_api_key: Option<String>,
    pub(crate) graphhopper_api_key: Option<String>,
    pub(crate) backend: Option<String>,
    pub(crate) osrm_base_url: Option<String>,
    pub(crate) usage_file: Option<Utf8PathBuf>,
}

/// Which engine fills the open-data slot, with its own settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum OpenDataSettings {
    Osrm,
    GraphHopper {
        api_key: String,
        usage_file: Utf8PathBuf,
    },
}

/// Validated provider configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ProviderSettings {
    pub(crate) google_api_key: String,
    pub(crate) here_api_key: String,
    pub(crate) open_data: OpenDataSettings,
    /// OSRM server used for OSRM routing and for road snapping.
    pub(crate) osrm_base_url: String,
}

impl ProviderSettings {
    pub(crate) fn resolve(flags: ProviderFlags, env: CredentialEnv) -> Result<Self, CliError> {
        let google_api_key = required(flags.google_api_key, ARG_GOOGLE_API_KEY, env.google_api_key)?;
        let here_api_key = required(flags.here_api_key, ARG_HERE_API_KEY, env.here_api_key)?;
        let backend = flags
            .backend
            .as_deref()
            .map(str::parse::<OpenDataBackend>)
            .transpose()?
            .unwrap_or_default();
        let open_data = match backend {
            OpenDataBackend::Osrm => OpenDataSettings::Osrm,
            OpenDataBackend::GraphHopper => OpenDataSettings::GraphHopper {
                api_key: required(
                    flags.graphhopper_api_key,
                    ARG_GRAPHHOPPER_API_KEY,
                    env.graphhopper_api_key,
                )?,
                usage_file: flags
                    .usage_file
                    .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_USAGE_FILE)),
            },
        };
        Ok(Self {
            google_api_key,
            here_api_key,
            open_data,
            osrm_base_url: flags
                .osrm_base_url
                .unwrap_or_else(|| OSRM_DEMO_URL.to_owned()),
        })
    }

    /// Kind of the provider filling the open-data slot.
    pub(crate) fn open_data_kind(&self) -> ProviderKind {
        match self.open_data {
            OpenDataSettings::Osrm => ProviderKind::Osrm,
            OpenDataSettings::GraphHopper { .. } => ProviderKind::GraphHopper,
        }
    }
}

/// Blank values count as missing so an empty `.env` entry is reported.
fn required(
    value: Option<String>,
    field: &'static str,
    env: &'static str,
) -> Result<String, CliError> {
    value
        .filter(|value| !value.trim().is_empty())
        .ok_or(CliError::MissingArgument { field, env })
}

/// Builds the comparator for one invocation.
pub(crate) trait ComparatorFactory {
    fn build(&self, settings: &ProviderSettings) -> Result<Comparator, CliError>;
}

/// Google as reference, HERE and the open-data backend as candidates, OSRM
/// nearest for snapping.
pub(crate) struct HttpComparatorFactory;

impl ComparatorFactory for HttpComparatorFactory {
    fn build(&self, settings: &ProviderSettings) -> Result<Comparator, CliError> {
        let google: Arc<dyn RouteProvider> = Arc::new(
            GoogleDirections::new(settings.google_api_key.as_str())
                .map_err(build_error(ProviderKind::Google))?,
        );
        let here: Arc<dyn RouteProvider> = Arc::new(
            HereRouting::new(settings.here_api_key.as_str())
                .map_err(build_error(ProviderKind::Here))?,
        );
        let open_data: Arc<dyn RouteProvider> = match &settings.open_data {
            OpenDataSettings::Osrm => Arc::new(
                OsrmRouting::new(settings.osrm_base_url.as_str())
                    .map_err(build_error(ProviderKind::Osrm))?,
            ),
            OpenDataSettings::GraphHopper {
                api_key,
                usage_file,
            } => Arc::new(
                GraphHopperRouting::new(api_key.as_str())
                    .map_err(build_error(ProviderKind::GraphHopper))?
                    .with_usage_counter(Arc::new(DailyUsageCounter::new(usage_file.clone()))),
            ),
        };
        let snapper = OsrmSnapper::new(settings.osrm_base_url.as_str())
            .map_err(build_error(ProviderKind::Osrm))?;
        let providers = ProviderSet::new(google, vec![here, open_data])?;
        Ok(Comparator::new(providers).with_snapper(Arc::new(snapper)))
    }
}

fn build_error(provider: ProviderKind) -> impl FnOnce(ProviderBuildError) -> CliError {
    move |source| CliError::BuildProvider { provider, source }
}
