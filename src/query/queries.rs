// region:    --- Booking
/// 예약 단건 조회
pub const GET_BOOKING: &str = "SELECT * FROM bookings WHERE id = $1";

/// 예약 단건 조회 (행 잠금)
pub const GET_BOOKING_FOR_UPDATE: &str = "SELECT * FROM bookings WHERE id = $1 FOR UPDATE";

/// 날짜 단위 직렬화를 위한 advisory lock (트랜잭션 종료 시 해제)
pub const LOCK_BOOKING_DATE: &str = "SELECT pg_advisory_xact_lock($1, $2)";

/// 같은 날짜의 점유 예약 잠금 조회
pub const LOCK_OCCUPIED_SLOTS: &str = r#"
    SELECT requester_id, time_slots
    FROM bookings
    WHERE booking_date = $1 AND status NOT IN ('rejected', 'cancelled')
    FOR UPDATE
"#;

/// 같은 날짜의 점유 예약 조회 (잠금 없음)
pub const GET_OCCUPIED_SLOTS: &str = r#"
    SELECT requester_id, time_slots
    FROM bookings
    WHERE booking_date = $1 AND status NOT IN ('rejected', 'cancelled')
"#;

/// 예약 생성
pub const INSERT_BOOKING: &str = r#"
    INSERT INTO bookings (
        id, booking_code, booking_date, time_slot, time_slots,
        requester_id, requester_name, requester_phone,
        pickup_address, pickup_lat, pickup_lng,
        dropoff_address, dropoff_lat, dropoff_lng,
        purpose, notes, status, created_at
    )
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
    RETURNING *
"#;

/// 예약 상태 변경
pub const UPDATE_BOOKING_STATUS: &str = r#"
    UPDATE bookings
    SET status = $2,
        approved_by = COALESCE($3, approved_by),
        assigned_to = COALESCE($4, assigned_to),
        rejection_reason = COALESCE($5, rejection_reason),
        updated_at = NOW()
    WHERE id = $1
    RETURNING *
"#;

/// 봉사자 배정
pub const ASSIGN_BOOKING: &str =
    "UPDATE bookings SET assigned_to = $2, updated_at = NOW() WHERE id = $1 RETURNING *";

/// 리뷰 작성
pub const REVIEW_BOOKING: &str = "UPDATE bookings SET rating = $2, review_text = $3, updated_at = NOW() WHERE id = $1 RETURNING *";

/// 예약 목록 (상태 필터 선택)
pub const LIST_BOOKINGS: &str = r#"
    SELECT * FROM bookings
    WHERE ($1::text IS NULL OR status = $1)
    ORDER BY created_at DESC
    OFFSET $2 LIMIT $3
"#;

/// 본인 예약 목록
pub const LIST_MY_BOOKINGS: &str =
    "SELECT * FROM bookings WHERE requester_id = $1 ORDER BY created_at DESC";
// endregion: --- Booking

// region:    --- Auction
/// 한 스냅샷으로 여러 테이블 읽기 (트랜잭션 첫 문장)
pub const SNAPSHOT_READ: &str = "SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY";

/// 상품 조회
pub const GET_ITEM: &str = "SELECT * FROM auction_items WHERE id = $1";

/// 상품 조회 (행 잠금)
pub const GET_ITEM_FOR_UPDATE: &str = "SELECT * FROM auction_items WHERE id = $1 FOR UPDATE";

/// 상품 생성
pub const INSERT_ITEM: &str = r#"
    INSERT INTO auction_items (
        id, title, description, starting_price, current_price, min_increment,
        donor_id, status, created_at
    )
    VALUES ($1, $2, $3, $4, $4, $5, $6, 'ready', $7)
    RETURNING *
"#;

/// 상품 정보 수정
pub const UPDATE_ITEM_DETAILS: &str = r#"
    UPDATE auction_items
    SET title = COALESCE($2, title),
        description = COALESCE($3, description),
        updated_at = NOW()
    WHERE id = $1
    RETURNING *
"#;

/// 입찰 반영 (가격 갱신 + 입찰중 상태)
pub const APPLY_BID: &str = r#"
    UPDATE auction_items
    SET current_price = $2, status = 'bidding', updated_at = NOW()
    WHERE id = $1
    RETURNING *
"#;

/// 직전 최고 입찰 (대기/승인)
pub const GET_LEADING_BID: &str = r#"
    SELECT * FROM auction_bids
    WHERE auction_item_id = $1 AND status IN ('pending', 'approved')
    ORDER BY amount DESC, created_at ASC
    LIMIT 1
"#;

/// 입찰 생성
pub const INSERT_BID: &str = r#"
    INSERT INTO auction_bids (id, auction_item_id, bidder_id, amount, status, created_at)
    VALUES ($1, $2, $3, $4, 'pending', $5)
    RETURNING *
"#;

/// 상품의 모든 입찰 (행 잠금)
pub const LOCK_ITEM_BIDS: &str =
    "SELECT * FROM auction_bids WHERE auction_item_id = $1 ORDER BY amount DESC FOR UPDATE";

/// 입찰 일괄 심사: 선택된 입찰만 승인, 나머지 거절
pub const REVIEW_ITEM_BIDS: &str = r#"
    UPDATE auction_bids
    SET status = CASE WHEN id = $2 THEN 'approved' ELSE 'rejected' END,
        reviewed_by = $3,
        reviewed_at = $4
    WHERE auction_item_id = $1
"#;

/// 낙찰자 지정
pub const SET_WINNER: &str = r#"
    UPDATE auction_items
    SET winner_id = $2, current_price = $3, status = 'payment_pending',
        payment_status = 'awaiting_payment', updated_at = NOW()
    WHERE id = $1
    RETURNING *
"#;

/// 결제 증빙 등록
pub const SET_PAYMENT_PROOF: &str = r#"
    UPDATE auction_items
    SET payment_proof_url = $2, payment_status = 'awaiting_verification', updated_at = NOW()
    WHERE id = $1
    RETURNING *
"#;

/// 결제 검증 결과 반영
pub const SET_PAYMENT_VERDICT: &str = r#"
    UPDATE auction_items
    SET status = $2, payment_status = $3, payment_verified_by = $4,
        payment_verified_at = $5, updated_at = NOW()
    WHERE id = $1
    RETURNING *
"#;

/// 상품 상태 변경
pub const SET_ITEM_STATUS: &str =
    "UPDATE auction_items SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *";

/// 상품 입찰 조회 (금액 내림차순)
pub const GET_ITEM_BIDS: &str = r#"
    SELECT * FROM auction_bids
    WHERE auction_item_id = $1
    ORDER BY amount DESC, created_at ASC
"#;

/// 상품 목록 (상태 그룹, 제목 검색)
pub const LIST_ITEMS: &str = r#"
    SELECT * FROM auction_items
    WHERE ($1::text[] IS NULL OR status = ANY($1))
      AND ($2::text IS NULL OR strpos(lower(title), lower($2)) > 0)
    ORDER BY created_at DESC
    OFFSET $3 LIMIT $4
"#;

/// 상품 목록 개수
pub const COUNT_ITEMS: &str = r#"
    SELECT COUNT(*) FROM auction_items
    WHERE ($1::text[] IS NULL OR status = ANY($1))
      AND ($2::text IS NULL OR strpos(lower(title), lower($2)) > 0)
"#;

/// 본인이 입찰한 상품 목록
pub const LIST_MY_BID_ITEMS: &str = r#"
    SELECT i.* FROM auction_items i
    WHERE EXISTS (SELECT 1 FROM auction_bids b WHERE b.auction_item_id = i.id AND b.bidder_id = $1)
    ORDER BY i.created_at DESC
    OFFSET $2 LIMIT $3
"#;

/// 본인이 입찰한 상품 개수
pub const COUNT_MY_BID_ITEMS: &str = r#"
    SELECT COUNT(*) FROM auction_items i
    WHERE EXISTS (SELECT 1 FROM auction_bids b WHERE b.auction_item_id = i.id AND b.bidder_id = $1)
"#;
// endregion: --- Auction
