use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct Category {
    pub id: Uuid,
    pub owner: Uuid,
    pub name: String,
}

impl Category {
    pub fn new(owner: Uuid, name: String) -> Self {
        Self {
            id: Uuid::now_v7(),
            owner,
            name,
        }
    }

    pub fn view(&self) -> CategoryView {
        CategoryView {
            id: self.id,
            name: self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryView {
    pub id: Uuid,
    pub name: String,
}

pub fn valid_category_name(name: &str) -> bool {
    !name.trim().is_empty()
}

#[cfg(test)]
mod category_model_tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Deep Work", true)]
    #[case("a", true)]
    #[case("", false)]
    #[case("   ", false)]
    fn it_should_require_a_nonblank_name(#[case] name: &str, #[case] ok: bool) {
        assert_eq!(valid_category_name(name), ok);
    }
}
