pub const API_HEROES: &str = "/api/heroes";

pub fn api_root(host: &str, port: u16) -> String {
    format!("http://{host}:{port}")
}

pub fn api_heroes(base: &str) -> String {
    format!("{base}{API_HEROES}")
}

pub fn api_hero(base: &str, id: i64) -> String {
    format!("{base}{API_HEROES}/{id}")
}
