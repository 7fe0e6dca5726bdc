pub mod config;

pub mod shared {
    pub mod auth;
    pub mod error;
    pub mod infrastructure {
        pub mod memory;
    }
}

pub mod modules {
    pub mod users {
        pub mod model;
        pub mod password;
        pub mod routes;
        pub mod store;
    }
    pub mod categories {
        pub mod model;
        pub mod routes;
        pub mod store;
    }
    pub mod entries {
        pub mod model;
        pub mod overlap;
        pub mod routes;
        pub mod store;
    }
    pub mod goals {
        pub mod model;
        pub mod progress;
        pub mod routes;
        pub mod store;
    }
    pub mod posts {
        pub mod model;
        pub mod routes;
        pub mod store;
    }
    pub mod follows {
        pub mod model;
        pub mod routes;
        pub mod store;
    }
    pub mod friends {
        pub mod model;
        pub mod routes;
        pub mod store;
    }
    pub mod circles {
        pub mod model;
        pub mod routes;
        pub mod store;
    }
    pub mod shields {
        pub mod model;
        pub mod routes;
        pub mod store;
    }
}

pub mod shell;

#[cfg(test)]
pub mod tests {
    pub mod fixtures;
    mod flows;
}
