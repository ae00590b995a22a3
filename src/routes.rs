use crate::api::Resource;
use crate::session::LOGIN_PATH;

/// Screens of the dashboard, addressed by path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
  Dashboard,
  Inventory,
  Logs,
  Profile,
  Settings,
  Login,
}

impl Route {
  pub const ALL: &'static [Route] = &[
    Route::Dashboard,
    Route::Inventory,
    Route::Logs,
    Route::Profile,
    Route::Settings,
    Route::Login,
  ];

  pub fn path(&self) -> &'static str {
    match self {
      Route::Dashboard => "/",
      Route::Inventory => "/inventory",
      Route::Logs => "/logs",
      Route::Profile => "/profile",
      Route::Settings => "/settings",
      Route::Login => LOGIN_PATH,
    }
  }

  /// Exact path match; a trailing slash is ignored.
  pub fn from_path(path: &str) -> Option<Route> {
    let trimmed = path.trim_end_matches('/');
    let path = if trimmed.is_empty() { "/" } else { trimmed };
    Route::ALL.iter().copied().find(|route| route.path() == path)
  }

  /// Everything except the login screen needs a session.
  pub fn is_protected(&self) -> bool {
    !matches!(self, Route::Login)
  }

  /// Resources warmed before the view opens.
  pub fn prefetch(&self) -> &'static [Resource] {
    match self {
      Route::Dashboard => &[Resource::Dashboard, Resource::SyncStatus],
      Route::Inventory => &[Resource::Inventory, Resource::SyncStatus],
      Route::Logs => &[],
      Route::Profile => &[Resource::Profile],
      Route::Settings => &[Resource::Settings],
      Route::Login => &[],
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_from_path() {
    assert_eq!(Route::from_path("/"), Some(Route::Dashboard));
    assert_eq!(Route::from_path(""), Some(Route::Dashboard));
    assert_eq!(Route::from_path("/inventory/"), Some(Route::Inventory));
    assert_eq!(Route::from_path("/login"), Some(Route::Login));
    assert_eq!(Route::from_path("/admin"), None);
  }

  #[test]
  fn test_paths_round_trip() {
    for route in Route::ALL {
      assert_eq!(Route::from_path(route.path()), Some(*route));
    }
  }

  #[test]
  fn test_only_login_is_public() {
    let public: Vec<_> = Route::ALL.iter().filter(|r| !r.is_protected()).collect();
    assert_eq!(public, vec![&Route::Login]);
  }
}
