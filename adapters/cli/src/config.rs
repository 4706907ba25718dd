use std::{fs, path::Path};

use anyhow::{Context, Result};
use portal_board_core::BoardConfig;

/// Values supplied on the command line that take precedence over the file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Overrides {
    pub(crate) seed: Option<u64>,
    pub(crate) columns: Option<u32>,
    pub(crate) rows: Option<u32>,
}

impl Overrides {
    /// Replaces the configured values with any that were supplied.
    pub(crate) fn apply(self, config: &mut BoardConfig) {
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(columns) = self.columns {
            config.columns = columns;
        }
        if let Some(rows) = self.rows {
            config.rows = rows;
        }
    }
}

/// Loads the board configuration, falling back to defaults without a path.
pub(crate) fn load(path: Option<&Path>) -> Result<BoardConfig> {
    let Some(path) = path else {
        return Ok(BoardConfig::default());
    };

    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read board config {}", path.display()))?;
    parse(&contents).with_context(|| format!("invalid board config {}", path.display()))
}

fn parse(contents: &str) -> Result<BoardConfig> {
    toml::from_str(contents).context("failed to parse board config toml contents")
}

#[cfg(test)]
mod tests {
    use super::*;
    use portal_board_core::{ObstacleCount, RawPoint, TemplateSet, TileKind, TileTemplate};

    #[test]
    fn empty_file_yields_the_reference_board() {
        assert_eq!(parse("").expect("parses"), BoardConfig::default());
    }

    #[test]
    fn reads_batches_points_and_templates() {
        let config = parse(
            r#"
            columns = 12
            rows = 8
            seed = 99

            [templates]
            floor = { name = "sand" }

            [[obstacles]]
            count = { minimum = 2, maximum = 5 }

            [[obstacles]]
            kind = "wall"
            count = { minimum = 1, maximum = 1 }

            [[portals]]
            x = -4
            y = 3

            [[bases]]
            x = 30
            y = 3
            "#,
        )
        .expect("parses");

        assert_eq!(config.columns, 12);
        assert_eq!(config.rows, 8);
        assert_eq!(config.seed, 99);
        assert_eq!(config.templates.floor, Some(TileTemplate::named("sand")));
        assert_eq!(config.templates.wall, TemplateSet::standard().wall);
        assert_eq!(config.obstacles.len(), 2);
        assert_eq!(config.obstacles[0].kind, TileKind::Wall);
        assert_eq!(config.obstacles[0].count, ObstacleCount::new(2, 5));
        assert_eq!(config.portals, vec![RawPoint::new(-4, 3)]);
        assert_eq!(config.bases, vec![RawPoint::new(30, 3)]);
        assert_eq!(config.retry_factor, BoardConfig::default().retry_factor);
    }

    #[test]
    fn unknown_categories_are_rejected() {
        let error = parse(
            r#"
            [[obstacles]]
            kind = "lava"
            count = { minimum = 1, maximum = 2 }
            "#,
        )
        .expect_err("lava is not a tile category");

        assert!(format!("{error:#}").contains("failed to parse board config"));
    }

    #[test]
    fn overrides_take_precedence() {
        let mut config = BoardConfig::default();
        Overrides {
            seed: Some(5),
            columns: None,
            rows: Some(11),
        }
        .apply(&mut config);

        assert_eq!(config.seed, 5);
        assert_eq!(config.columns, BoardConfig::default().columns);
        assert_eq!(config.rows, 11);
    }

    #[test]
    fn missing_file_reports_its_path() {
        let error =
            load(Some(Path::new("/nonexistent/board.toml"))).expect_err("file is missing");

        assert!(format!("{error}").contains("/nonexistent/board.toml"));
    }
}
