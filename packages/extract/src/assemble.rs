//! One full scrape: main page, client tab, PPPoE tab.
//!
//! Contexts are read strictly in order because each needs the page in a
//! specific navigated state. Field-level misses become the sentinel.
//! Only the structural waits (record page marker, tab activation, tab
//! marker) can fail the scrape.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use portal_scrape_extract_models::{ClientData, CollectedRecord, MainPageData, PppoeData};
use scraper::ElementRef;

use crate::ScrapeError;
use crate::config::ExtractConfig;
use crate::reader::FieldReader;
use crate::refine::refine;
use crate::services::read_services;
use crate::session::{MANIFEST_FILE, Page, Session, SessionError, SessionManifest, TabEntry};

/// Text present on the record-detail page once it has loaded.
pub const DETAIL_MARKER: &str = "Детализация заявки";

/// Title of the client-data tab.
pub const CLIENT_TAB: &str = "Данные клиента";

/// Text present once the client-data panel has rendered.
pub const CLIENT_MARKER: &str = "Абонентский номер";

/// Title of the service-settings tab.
pub const SETTINGS_TAB: &str = "Настройки и активация услуг";

/// Text present once the PPPoE settings have rendered.
pub const PPPOE_MARKER: &str = "Логин PPPoE";

/// Prefix of the per-scrape capture directories under `dump_dir`.
pub const CAPTURE_PREFIX: &str = "capture-";

/// Field labels as they appear on the portal.
pub mod labels {
    pub const REQUEST_NUMBER: &str = "Номер заявки";
    pub const ACCOUNT_NUMBER: &str = "Лицевой счет";
    pub const ADDRESS: &str = "Адрес подключения";
    pub const TEMP_PASSWORD: &str = "Временный пароль";

    pub const ABONENT_NUMBER: &str = "Абонентский номер";
    pub const CONTACT_MOBILE: &str = "Контактный мобильный телефон";
    pub const CLIENT_MOBILE: &str = "Мобильный телефон клиента";
    pub const LASTNAME: &str = "Фамилия";
    pub const FIRSTNAME: &str = "Имя";
    pub const MIDDLENAME: &str = "Отчество";

    pub const PPPOE_LOGIN: &str = "Логин PPPoE";
    pub const PPPOE_PASSWORD: &str = "Пароль PPPoE";
}

/// Runs one scrape against `session`.
///
/// # Errors
///
/// Returns [`ScrapeError::Structural`] if the record page marker never
/// appears, a tab cannot be activated, or a tab's marker never appears.
pub fn scrape<S: Session + ?Sized>(
    session: &mut S,
    config: &ExtractConfig,
) -> Result<CollectedRecord, ScrapeError> {
    let reader = FieldReader::new(config);
    let timeouts = config.timeouts;
    let mut dumps = Dumps::new(config.dump_dir.as_deref());

    session
        .wait_for_text(DETAIL_MARKER, timeouts.page_ready(), timeouts.poll())
        .map_err(|e| ScrapeError::structural("record page", e))?;
    let page = session
        .snapshot()
        .map_err(|e| ScrapeError::structural("record page", e))?;
    dumps.save("main.html", None, &page);
    let main = read_main(&reader, &page);

    let page = open_tab(session, config, CLIENT_TAB, CLIENT_MARKER, timeouts.tab())?;
    dumps.save("client.html", Some(CLIENT_TAB), &page);
    let client = read_client(&reader, page.active_panel());

    let page = open_tab(
        session,
        config,
        SETTINGS_TAB,
        PPPOE_MARKER,
        timeouts.pppoe_marker(),
    )?;
    dumps.save("pppoe.html", Some(SETTINGS_TAB), &page);
    let pppoe = read_pppoe(&reader, page.active_panel());

    log::info!(
        "Scraped request {} ({} services)",
        main.request_number,
        main.services.len()
    );

    Ok(CollectedRecord {
        main,
        client,
        pppoe,
    })
}

/// Clicks a tab, waits for the panel to settle and for `marker` to
/// appear, then snapshots the page.
fn open_tab<S: Session + ?Sized>(
    session: &mut S,
    config: &ExtractConfig,
    title: &'static str,
    marker: &str,
    marker_timeout: Duration,
) -> Result<Page, ScrapeError> {
    let timeouts = config.timeouts;
    let stage = |e| ScrapeError::structural(title, e);

    log::debug!("Opening tab '{title}'");
    session.activate_tab(title, timeouts.tab()).map_err(stage)?;
    std::thread::sleep(timeouts.settle());
    session
        .wait_for_text(marker, marker_timeout, timeouts.poll())
        .map_err(stage)?;
    session.snapshot().map_err(stage)
}

/// Reads the request-detail fields and services, then narrows them.
#[must_use]
pub fn read_main(reader: &FieldReader, page: &Page) -> MainPageData {
    refine(MainPageData {
        request_number: reader.read_main_field(page, labels::REQUEST_NUMBER),
        account_number: reader.read_main_field(page, labels::ACCOUNT_NUMBER),
        address: reader.read_main_field(page, labels::ADDRESS),
        temp_password: reader.read_main_field(page, labels::TEMP_PASSWORD),
        services: read_services(page),
    })
}

/// Reads the client-data fields from the active panel.
#[must_use]
pub fn read_client(reader: &FieldReader, panel: ElementRef<'_>) -> ClientData {
    ClientData {
        abonent_number: reader.read_panel_field(panel, labels::ABONENT_NUMBER),
        contact_mobile: reader.read_panel_field(panel, labels::CONTACT_MOBILE),
        client_mobile: reader.read_panel_field(panel, labels::CLIENT_MOBILE),
        lastname: reader.read_panel_field(panel, labels::LASTNAME),
        firstname: reader.read_panel_field(panel, labels::FIRSTNAME),
        middlename: reader.read_panel_field(panel, labels::MIDDLENAME),
    }
}

/// Reads the PPPoE credentials from the active panel.
#[must_use]
pub fn read_pppoe(reader: &FieldReader, panel: ElementRef<'_>) -> PppoeData {
    PppoeData {
        login: reader.read_panel_field(panel, labels::PPPOE_LOGIN),
        password: reader.read_panel_field(panel, labels::PPPOE_PASSWORD),
    }
}

/// Writes page captures for offline replay.
///
/// Every scrape gets its own `capture-NNNN` directory, and the manifest is
/// rewritten after each page so a scrape that fails part way leaves a
/// capture describing exactly the pages it reached. Write failures are
/// logged and otherwise ignored.
struct Dumps {
    dir: Option<PathBuf>,
    manifest: SessionManifest,
}

impl Dumps {
    fn new(root: Option<&Path>) -> Self {
        let dir = root.and_then(|root| match create_capture_dir(root) {
            Ok(dir) => {
                log::info!("Saving page captures to {}", dir.display());
                Some(dir)
            }
            Err(e) => {
                log::debug!("Dump directory {} unavailable: {e}", root.display());
                None
            }
        });
        Self {
            dir,
            manifest: SessionManifest {
                main: PathBuf::from("main.html"),
                tabs: Vec::new(),
            },
        }
    }

    fn save(&mut self, file: &str, tab: Option<&str>, page: &Page) {
        let Some(dir) = &self.dir else {
            return;
        };
        if let Err(e) = std::fs::write(dir.join(file), page.markup()) {
            log::debug!("Failed to write dump {file}: {e}");
            return;
        }
        match tab {
            Some(title) => self.manifest.tabs.push(TabEntry {
                title: title.to_owned(),
                file: PathBuf::from(file),
            }),
            None => self.manifest.main = PathBuf::from(file),
        }

        match toml::to_string(&self.manifest) {
            Ok(text) => {
                if let Err(e) = std::fs::write(dir.join(MANIFEST_FILE), text) {
                    log::debug!("Failed to write {MANIFEST_FILE}: {e}");
                }
            }
            Err(e) => log::debug!("Failed to serialize {MANIFEST_FILE}: {e}"),
        }
    }
}

/// Creates the first free `capture-NNNN` directory under `root`.
///
/// `create_dir` fails on an existing directory, so concurrent scrapes
/// sharing `root` never receive the same one.
fn create_capture_dir(root: &Path) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(root)?;
    for n in 1..=u32::MAX {
        let dir = root.join(format!("{CAPTURE_PREFIX}{n:04}"));
        match std::fs::create_dir(&dir) {
            Ok(()) => return Ok(dir),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {}
            Err(e) => return Err(e),
        }
    }
    Err(std::io::Error::other("no free capture directory"))
}

impl ScrapeError {
    const fn structural(stage: &'static str, source: SessionError) -> Self {
        Self::Structural { stage, source }
    }
}
