//! Хранилище «ключ — строка» и операции над сохранёнными позициями.

use crate::aggregate::merge_quotes;
use crate::config::AdvisorConfig;
use crate::error::AdvisorError;
use crate::types::{EnrichedPosition, QuoteBook, StockPosition, StockUpdate};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Ключ со списком позиций.
pub const STOCKS_KEY: &str = "stocks";
/// Ключ со счётчиком просмотров.
pub const PAGE_VIEW_KEY: &str = "pageView";

/// Хранилище строковых значений по ключу.
pub trait KeyValueStore {
    /// Возвращает значение или `None`, если ключа нет.
    fn get(&self, key: &str) -> Result<Option<String>, AdvisorError>;
    /// Записывает значение.
    fn set(&mut self, key: &str, value: &str) -> Result<(), AdvisorError>;
}

/// Хранилище в памяти.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    /// Пустое хранилище.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, AdvisorError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), AdvisorError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Хранилище в каталоге: по файлу на ключ.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Хранилище в указанном каталоге; каталог создаётся при первой записи.
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, AdvisorError> {
        match fs::read_to_string(self.path(key)) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), AdvisorError> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path(key), value)?;
        Ok(())
    }
}

/// Позиции пользователя поверх хранилища.
#[derive(Debug, Clone)]
pub struct PortfolioStore<S> {
    store: S,
}

impl<S: KeyValueStore> PortfolioStore<S> {
    /// Оборачивает хранилище.
    #[inline]
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Доступ к хранилищу.
    #[inline]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Возвращает хранилище.
    #[inline]
    pub fn into_inner(self) -> S {
        self.store
    }

    /// Первый запуск заполняет позиции `defaults`, повторный увеличивает счётчик.
    ///
    /// Возвращает новое значение счётчика просмотров.
    ///
    /// ```
    /// # use stock_advisor::{default_stocks, MemoryStore, PortfolioStore};
    /// let mut book = PortfolioStore::new(MemoryStore::new());
    /// assert_eq!(book.init(&default_stocks()).unwrap(), 1);
    /// assert_eq!(book.init(&default_stocks()).unwrap(), 2);
    /// ```
    pub fn init(&mut self, defaults: &[StockPosition]) -> Result<u64, AdvisorError> {
        let views = match self.store.get(PAGE_VIEW_KEY)? {
            None => {
                log::debug!("first run, seeding {} positions", defaults.len());
                self.save(defaults)?;
                1
            }
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(views) => views.saturating_add(1),
                Err(_) => {
                    log::warn!("unparseable view counter '{raw}', restarting at 1");
                    1
                }
            },
        };
        self.store.set(PAGE_VIEW_KEY, &views.to_string())?;
        Ok(views)
    }

    /// Заменяет сохранённые позиции.
    #[inline]
    pub fn reset(&mut self, defaults: &[StockPosition]) -> Result<(), AdvisorError> {
        self.save(defaults)
    }

    /// Читает позиции; отсутствующие или повреждённые данные дают пустой список.
    pub fn stocks(&self) -> Result<Vec<StockPosition>, AdvisorError> {
        let Some(raw) = self.store.get(STOCKS_KEY)? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str(&raw) {
            Ok(stocks) => Ok(stocks),
            Err(err) => {
                log::warn!("stored positions are malformed, ignoring: {err}");
                Ok(Vec::new())
            }
        }
    }

    /// Обновляет позицию с тикером `symbol` и сохраняет список.
    pub fn update_stock(
        &mut self,
        symbol: &str,
        update: &StockUpdate,
    ) -> Result<Vec<StockPosition>, AdvisorError> {
        let mut stocks = self.stocks()?;
        let mut found = false;
        for stock in stocks.iter_mut().filter(|stock| stock.symbol == symbol) {
            update.apply(stock);
            found = true;
        }
        if !found {
            log::debug!("update for unknown symbol {symbol} ignored");
        }
        self.save(&stocks)?;
        Ok(stocks)
    }

    /// Загружает позиции и объединяет их с котировками.
    pub fn merge_quotes(
        &self,
        quotes: &QuoteBook,
        config: &AdvisorConfig,
    ) -> Result<Vec<EnrichedPosition>, AdvisorError> {
        Ok(merge_quotes(&self.stocks()?, quotes, config))
    }

    fn save(&mut self, stocks: &[StockPosition]) -> Result<(), AdvisorError> {
        let json = serde_json::to_string(stocks)?;
        self.store.set(STOCKS_KEY, &json)
    }
}
