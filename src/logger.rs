use colored::{Color, Colorize};
use log::{Level, LevelFilter};

fn level_color(level: Level) -> Color {
    match level {
        Level::Error => Color::Red,
        Level::Warn => Color::Yellow,
        Level::Info => Color::Blue,
        Level::Debug => Color::Magenta,
        Level::Trace => Color::Green,
    }
}

pub fn base(level: LevelFilter) -> fern::Dispatch {
    fern::Dispatch::new().level(level)
}

/// Writes records to stderr behind a colored level prefix. Debug and trace
/// records also name the module that logged them.
pub fn stderr(base: fern::Dispatch) -> fern::Dispatch {
    base.format(move |out, message, record| {
        let level = record.level();
        let prefix = format!("{}:", level.to_string().to_lowercase()).color(level_color(level));
        if level >= Level::Debug {
            out.finish(format_args!(
                "{} [{}] {}",
                prefix,
                record.target().dimmed(),
                message
            ))
        } else {
            out.finish(format_args!("{} {}", prefix, message))
        }
    })
    .chain(std::io::stderr())
}

pub fn init(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    stderr(base(level)).apply()
}
