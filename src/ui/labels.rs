use crate::preferences::Language;
use crate::routes::Route;

/// UI strings for one language.
pub struct Labels {
  pub dashboard: &'static str,
  pub inventory: &'static str,
  pub logs: &'static str,
  pub profile: &'static str,
  pub settings: &'static str,
  pub login: &'static str,
  pub loading: &'static str,
  pub empty: &'static str,
  pub anonymous: &'static str,
  pub retry_hint: &'static str,
  pub level: &'static str,
  pub gold: &'static str,
  pub items: &'static str,
  pub clears_this_week: &'static str,
  pub last_dungeon: &'static str,
  pub last_sync: &'static str,
  pub never: &'static str,
  pub sync_failed: &'static str,
  pub capacity: &'static str,
  pub equipped: &'static str,
  pub all_types: &'static str,
  pub cleared: &'static str,
  pub failed: &'static str,
  pub end_of_logs: &'static str,
  pub more_hint: &'static str,
  pub guild: &'static str,
  pub no_guild: &'static str,
  pub joined: &'static str,
  pub public_profile: &'static str,
  pub notifications: &'static str,
  pub auto_sync: &'static str,
  pub on: &'static str,
  pub off: &'static str,
  pub token_prompt: &'static str,
  pub login_hint: &'static str,
  pub connecting: &'static str,
}

pub const KO: Labels = Labels {
  dashboard: "대시보드",
  inventory: "인벤토리",
  logs: "던전 기록",
  profile: "프로필",
  settings: "설정",
  login: "로그인",
  loading: "불러오는 중...",
  empty: "데이터가 없습니다.",
  anonymous: "로그인 필요",
  retry_hint: "'r' 키로 다시 시도",
  level: "레벨",
  gold: "골드",
  items: "아이템",
  clears_this_week: "이번 주 클리어",
  last_dungeon: "최근 던전",
  last_sync: "마지막 동기화",
  never: "없음",
  sync_failed: "동기화 실패",
  capacity: "보관함",
  equipped: "장착",
  all_types: "전체",
  cleared: "클리어",
  failed: "실패",
  end_of_logs: "마지막 기록입니다.",
  more_hint: "'m' 키로 더 보기",
  guild: "길드",
  no_guild: "소속 없음",
  joined: "가입일",
  public_profile: "프로필 공개",
  notifications: "알림",
  auto_sync: "자동 동기화",
  on: "켜짐",
  off: "꺼짐",
  token_prompt: "액세스 토큰",
  login_hint: "토큰을 입력하고 Enter를 누르세요.",
  connecting: "연결 중...",
};

pub const EN: Labels = Labels {
  dashboard: "Dashboard",
  inventory: "Inventory",
  logs: "Dungeon logs",
  profile: "Profile",
  settings: "Settings",
  login: "Login",
  loading: "Loading...",
  empty: "Nothing here yet.",
  anonymous: "signed out",
  retry_hint: "Press 'r' to retry.",
  level: "Level",
  gold: "Gold",
  items: "Items",
  clears_this_week: "Clears this week",
  last_dungeon: "Last dungeon",
  last_sync: "Last sync",
  never: "never",
  sync_failed: "Sync failed",
  capacity: "Capacity",
  equipped: "equipped",
  all_types: "all",
  cleared: "cleared",
  failed: "failed",
  end_of_logs: "No older logs.",
  more_hint: "Press 'm' for more.",
  guild: "Guild",
  no_guild: "none",
  joined: "Joined",
  public_profile: "Public profile",
  notifications: "Notifications",
  auto_sync: "Auto sync",
  on: "on",
  off: "off",
  token_prompt: "Access token",
  login_hint: "Paste a token and press Enter.",
  connecting: "Connecting...",
};

impl Labels {
  pub fn for_language(language: Language) -> &'static Labels {
    match language {
      Language::Ko => &KO,
      Language::En => &EN,
    }
  }

  pub fn route(&self, route: Route) -> &'static str {
    match route {
      Route::Dashboard => self.dashboard,
      Route::Inventory => self.inventory,
      Route::Logs => self.logs,
      Route::Profile => self.profile,
      Route::Settings => self.settings,
      Route::Login => self.login,
    }
  }

  pub fn toggle(&self, value: bool) -> &'static str {
    if value {
      self.on
    } else {
      self.off
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_language_picks_table() {
    assert_eq!(Labels::for_language(Language::Ko).route(Route::Logs), "던전 기록");
    assert_eq!(Labels::for_language(Language::En).route(Route::Logs), "Dungeon logs");
  }
}
