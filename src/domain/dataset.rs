//! Exported datasets as polars data frames

use polars::prelude::*;

/// Column names of a loaded dataset
pub mod columns {
    pub const TITLE: &str = "title";
    pub const FREE: &str = "free";
    pub const SCORE: &str = "score";
    pub const PRICE: &str = "price";
    pub const CONTENT_RATING: &str = "contentRating";
    pub const GENRE: &str = "genre";
    pub const SIZE: &str = "size";

    /// Size in megabytes, present on a [`SizedDataset`](super::SizedDataset) only
    pub const APP_SIZE: &str = "appSize";

    pub const ALL: [&str; 7] = [TITLE, FREE, SCORE, PRICE, CONTENT_RATING, GENRE, SIZE];
}

use columns::{CONTENT_RATING, FREE, GENRE, PRICE, SCORE, SIZE, TITLE};

/// One application row, for building a dataset in memory
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppRow {
    pub title: Option<String>,
    pub free: Option<bool>,
    pub score: Option<f64>,
    pub price: Option<f64>,
    pub content_rating: Option<String>,
    pub genre: Option<String>,
    pub size: Option<String>,
}

/// A loaded CSV export.
///
/// The frame always carries the seven export columns: `free` as a boolean,
/// `score` and `price` as `f64`, the rest as strings. Empty or unreadable
/// cells are null.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    frame: DataFrame,
}

impl Dataset {
    pub fn from_rows(rows: &[AppRow]) -> PolarsResult<Self> {
        let frame = df!(
            TITLE => rows.iter().map(|r| r.title.clone()).collect::<Vec<_>>(),
            FREE => rows.iter().map(|r| r.free).collect::<Vec<_>>(),
            SCORE => rows.iter().map(|r| r.score).collect::<Vec<_>>(),
            PRICE => rows.iter().map(|r| r.price).collect::<Vec<_>>(),
            CONTENT_RATING => rows.iter().map(|r| r.content_rating.clone()).collect::<Vec<_>>(),
            GENRE => rows.iter().map(|r| r.genre.clone()).collect::<Vec<_>>(),
            SIZE => rows.iter().map(|r| r.size.clone()).collect::<Vec<_>>(),
        )?;
        Ok(Self { frame })
    }

    /// Typed dataset from a frame whose columns were all read as text.
    ///
    /// Columns may come in any order; absent ones become all-null and extra
    /// ones are dropped.
    pub fn from_text_frame(frame: DataFrame) -> PolarsResult<Self> {
        let missing: Vec<Expr> = columns::ALL
            .iter()
            .copied()
            .filter(|name| frame.column(name).is_err())
            .map(|name| lit(NULL).cast(DataType::String).alias(name))
            .collect();

        let frame = frame
            .lazy()
            .with_columns(missing)
            .select([
                col(TITLE),
                parse_flag(col(FREE)).alias(FREE),
                col(SCORE).cast(DataType::Float64),
                col(PRICE).cast(DataType::Float64),
                col(CONTENT_RATING),
                col(GENRE),
                col(SIZE),
            ])
            .collect()?;
        Ok(Self { frame })
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn lazy(&self) -> LazyFrame {
        self.frame.clone().lazy()
    }

    pub fn len(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }
}

/// Rows whose `size` was given in megabytes, with the parsed `appSize` column
#[derive(Debug, Clone, Default)]
pub struct SizedDataset {
    frame: DataFrame,
}

impl SizedDataset {
    pub fn new(frame: DataFrame) -> Self {
        Self { frame }
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn lazy(&self) -> LazyFrame {
        self.frame.clone().lazy()
    }

    pub fn len(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }
}

/// `true`/`false` in any case and `1`/`0`; anything else is null
fn parse_flag(text: Expr) -> Expr {
    let value = text.str().strip_chars(lit(NULL)).str().to_lowercase();
    when(value.clone().eq(lit("true")).or(value.clone().eq(lit("1"))))
        .then(lit(true))
        .when(value.clone().eq(lit("false")).or(value.eq(lit("0"))))
        .then(lit(false))
        .otherwise(lit(NULL).cast(DataType::Boolean))
}
