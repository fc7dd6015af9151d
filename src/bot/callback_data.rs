//! Callback data carried by inline keyboard buttons
//!
//! Formats: `back:root`, `sec:<section>`, `grp:<section>:<group>`,
//! `itm:<section>:<item>`, `sub:<section>:<group>:<child>` and `chk:join`.
//! Indices are parsed from the right so section keys may contain `:`.

/// What a pressed button asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    MainMenu,
    Section(String),
    Group { section: String, group: usize },
    Item { section: String, item: usize },
    Child { section: String, group: usize, child: usize },
    CheckMembership,
}

impl CallbackAction {
    /// Parse button data; unknown or malformed data gives `None`
    pub fn parse(data: &str) -> Option<Self> {
        let (kind, rest) = data.split_once(':')?;
        let action = match kind {
            "back" if rest == "root" => CallbackAction::MainMenu,
            "chk" if rest == "join" => CallbackAction::CheckMembership,
            "sec" => CallbackAction::Section(section_key(rest)?.to_string()),
            "grp" => {
                let (section, group) = split_index(rest)?;
                CallbackAction::Group { section, group }
            }
            "itm" => {
                let (section, item) = split_index(rest)?;
                CallbackAction::Item { section, item }
            }
            "sub" => {
                let (head, child) = rest.rsplit_once(':')?;
                let (section, group) = split_index(head)?;
                CallbackAction::Child {
                    section,
                    group,
                    child: child.parse().ok()?,
                }
            }
            _ => return None,
        };
        Some(action)
    }

    pub fn to_data(&self) -> String {
        match self {
            CallbackAction::MainMenu => "back:root".to_string(),
            CallbackAction::CheckMembership => "chk:join".to_string(),
            CallbackAction::Section(section) => format!("sec:{section}"),
            CallbackAction::Group { section, group } => format!("grp:{section}:{group}"),
            CallbackAction::Item { section, item } => format!("itm:{section}:{item}"),
            CallbackAction::Child {
                section,
                group,
                child,
            } => format!("sub:{section}:{group}:{child}"),
        }
    }
}

fn section_key(raw: &str) -> Option<&str> {
    (!raw.is_empty()).then_some(raw)
}

fn split_index(raw: &str) -> Option<(String, usize)> {
    let (section, index) = raw.rsplit_once(':')?;
    Some((section_key(section)?.to_string(), index.parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_all_kinds() {
        assert_eq!(CallbackAction::parse("back:root"), Some(CallbackAction::MainMenu));
        assert_eq!(CallbackAction::parse("chk:join"), Some(CallbackAction::CheckMembership));
        assert_eq!(
            CallbackAction::parse("sec:office"),
            Some(CallbackAction::Section("office".to_string()))
        );
        assert_eq!(
            CallbackAction::parse("grp:prog:3"),
            Some(CallbackAction::Group {
                section: "prog".to_string(),
                group: 3
            })
        );
        assert_eq!(
            CallbackAction::parse("itm:prog:0"),
            Some(CallbackAction::Item {
                section: "prog".to_string(),
                item: 0
            })
        );
        assert_eq!(
            CallbackAction::parse("sub:prog:2:7"),
            Some(CallbackAction::Child {
                section: "prog".to_string(),
                group: 2,
                child: 7
            })
        );
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for data in [
            "",
            "sec:",
            "back:home",
            "itm:prog",
            "itm:prog:x",
            "itm::1",
            "grp:prog:-1",
            "sub:prog:1",
            "nope:prog",
            "noseparator",
        ] {
            assert_eq!(CallbackAction::parse(data), None, "{data}");
        }
    }

    #[test]
    fn test_section_keys_with_colons() {
        let action = CallbackAction::Child {
            section: "a:b".to_string(),
            group: 1,
            child: 2,
        };
        assert_eq!(action.to_data(), "sub:a:b:1:2");
        assert_eq!(CallbackAction::parse(&action.to_data()), Some(action));
    }
}
