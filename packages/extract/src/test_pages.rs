//! Captured-page fixtures shared by the assembler and pool tests.

use std::path::{Path, PathBuf};

use crate::assemble::{CLIENT_TAB, SETTINGS_TAB};
use crate::session::StaticSession;

pub const MAIN_PAGE: &str = r##"<!DOCTYPE html>
<html><body>
<h1>Детализация заявки</h1>
<div class="actions"><button>Обновить</button> <button>Распечатать заявку</button></div>
<table class="details">
  <tr><td>Номер заявки</td><td>Req123456 от 01.02.2024</td></tr>
  <tr><td>Лицевой счет</td><td>50012345 <a href="#">Последние заявки клиента</a></td></tr>
  <tr><td>Адрес подключения</td><td>г. Москва,  ул. Мира, д. 1, кв. 2</td></tr>
</table>
<div class="info"><div>Временный пароль</div><div>Xy12ab <button>Обновить</button></div></div>
<table class="services">
  <thead><tr><th>Продукт</th><th>Тарифный план</th></tr></thead>
  <tbody>
    <tr><td>Домашний интернет</td><td>Турбо 500</td></tr>
    <tr><td>Цифровое ТВ</td><td>Базовый</td></tr>
    <tr><td></td><td>Итого: 1200</td></tr>
  </tbody>
</table>
</body></html>"##;

pub const CLIENT_PAGE: &str = r##"<!DOCTYPE html>
<html><body>
<ul class="nav-tabs"><li><a href="#client">Данные клиента</a></li><li><a href="#settings">Настройки и активация услуг</a></li></ul>
<div class="tab-content">
<div class="tab-pane active" id="client">
<div class="form-group"><label for="cm">Контактный мобильный телефон</label><input id="cm" value="+7 900 111-22-33"></div>
<div class="row"><div class="col"><span>Мобильный телефон клиента</span></div><div class="col"><input value="+7 900 444-55-66"></div></div>
<div class="form-group"><label>Фамилия</label><input value="Иванов"></div>
<div class="form-group"><label>Имя</label><input value="Пётр"></div>
<div class="form-group"><label>Отчество</label><input value="Сергеевич"></div>
<table><tr><th>Абонентский номер</th><td>9001234567</td></tr></table>
</div>
<div class="tab-pane" id="settings"></div>
</div>
</body></html>"##;

pub const PPPOE_PAGE: &str = r##"<!DOCTYPE html>
<html><body>
<ul class="nav-tabs"><li><a href="#client">Данные клиента</a></li><li><a href="#settings">Настройки и активация услуг</a></li></ul>
<div class="tab-content">
<div class="tab-pane" id="client"><label>Имя</label><input value="Пётр"></div>
<div class="tab-pane active" id="settings">
<div class="form-group"><label for="lg">Логин PPPoE</label><input id="lg" value="user1"></div>
<div class="form-group"><label>Пароль PPPoE</label><input type="text" value="secret42"> <button>Обновить</button></div>
</div>
</div>
</body></html>"##;

/// A session with every page the scrape visits.
pub fn full_session() -> StaticSession {
    StaticSession::new(MAIN_PAGE)
        .with_tab(CLIENT_TAB, CLIENT_PAGE)
        .with_tab(SETTINGS_TAB, PPPOE_PAGE)
}

/// A full session whose request number is `Req{n}` and PPPoE login is
/// `user{n}`.
pub fn numbered_session(n: u32) -> StaticSession {
    StaticSession::new(MAIN_PAGE.replace("Req123456", &format!("Req{n}")))
        .with_tab(CLIENT_TAB, CLIENT_PAGE)
        .with_tab(SETTINGS_TAB, PPPOE_PAGE.replace("user1", &format!("user{n}")))
}

/// An empty per-test directory under the system temp dir.
pub fn temp_root(name: &str) -> PathBuf {
    let root =
        std::env::temp_dir().join(format!("portal_scrape_{name}_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&root);
    root
}

/// Capture directories written under `root`, in name order.
pub fn capture_dirs(root: &Path) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = std::fs::read_dir(root)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|path| path.is_dir())
        .collect();
    dirs.sort();
    dirs
}
