use std::fmt;
use std::str::FromStr;

/// Named task of the asset pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TaskKind {
    Style,
    Icon,
    Sprite,
    Script,
    Fonts,
    Image,
    Html,
}

impl TaskKind {
    /// Every task, in aggregate build order.
    pub const ALL: [TaskKind; 7] = [
        TaskKind::Style,
        TaskKind::Icon,
        TaskKind::Sprite,
        TaskKind::Script,
        TaskKind::Fonts,
        TaskKind::Image,
        TaskKind::Html,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Style => "style",
            Self::Icon => "icon",
            Self::Sprite => "sprite",
            Self::Script => "script",
            Self::Fonts => "fonts",
            Self::Image => "image",
            Self::Html => "html",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TaskKind {
    type Err = String;

    /// Accepts canonical names and the `<name>:build` spelling
    /// (`js:build`/`js` for scripts).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        let name = name.strip_suffix(":build").unwrap_or(&name);
        match name {
            "style" | "css" => Ok(Self::Style),
            "icon" | "iconfont" => Ok(Self::Icon),
            "sprite" => Ok(Self::Sprite),
            "script" | "js" => Ok(Self::Script),
            "fonts" | "font" => Ok(Self::Fonts),
            "image" | "img" => Ok(Self::Image),
            "html" => Ok(Self::Html),
            _ => Err(format!(
                "unknown task `{s}` (expected one of: {})",
                Self::ALL.map(Self::name).join(", ")
            )),
        }
    }
}
