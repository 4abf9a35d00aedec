//! 에러/경고 코드 상수 정의
//!
//! 프론트엔드에서 i18n 처리를 위해 에러 코드를 문자열로 반환합니다.

/// 복제본의 하위 오브젝트 구조가 원본과 다름 (작업 중단)
pub const ERR_STRUCTURAL_DIVERGENCE: &str = "ERR_STRUCTURAL_DIVERGENCE";

/// 선택 항목이 비어 있음
pub const ERR_SELECTION_EMPTY: &str = "ERR_SELECTION_EMPTY";

/// 선택 항목이 스토어에 없음
pub const ERR_NOT_IN_STORE: &str = "ERR_NOT_IN_STORE";

/// 잘못된 경로 또는 패턴
pub const ERR_INVALID_INPUT: &str = "ERR_INVALID_INPUT";

/// 스토어 I/O 실패
pub const ERR_STORE: &str = "ERR_STORE";

/// 항목 복사 실패 (해당 항목만 건너뜀)
pub const WARN_COPY_FAILED: &str = "WARN_COPY_FAILED";

/// 씬 파일은 참조를 바꾸지 않고 복사만 함
pub const WARN_SHALLOW_COPY: &str = "WARN_SHALLOW_COPY";

/// 복제된 파일을 읽을 수 없음
pub const WARN_UNLOADABLE_FILE: &str = "WARN_UNLOADABLE_FILE";

/// 참조 대상 오브젝트가 원본에 없음
pub const WARN_DANGLING_REFERENCE: &str = "WARN_DANGLING_REFERENCE";

/// 복제 위치에 대상 오브젝트가 없음
pub const WARN_UNRESOLVED_DESTINATION: &str = "WARN_UNRESOLVED_DESTINATION";

/// 이름이 같은 후보가 여럿이고 위치로 구분할 수 없는 타입
pub const WARN_AMBIGUOUS_REFERENCE_TYPE: &str = "WARN_AMBIGUOUS_REFERENCE_TYPE";
