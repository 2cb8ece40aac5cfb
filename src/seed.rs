//! Built-in feed shown before the first successful cycle, and kept whenever
//! a cycle comes back empty.

use crate::analyze::briefing::{today, vietnamese_long_date, Briefing};
use crate::category::Category;
use crate::news::{search_fallback_url, NewsItem};

struct SeedArticle {
    id: &'static str,
    title: &'static str,
    source: &'static str,
    time_ago: &'static str,
    category: Category,
    summary: [&'static str; 3],
}

const SEED_ARTICLES: [SeedArticle; 5] = [
    SeedArticle {
        id: "seed-1",
        title: "Giá chung cư Hà Nội tiếp tục lập đỉnh mới trong tháng 5",
        source: "VnExpress",
        time_ago: "2 giờ trước",
        category: Category::MarketPrice,
        summary: [
            "Giá trung bình căn hộ sơ cấp đạt 58 triệu đồng/m2.",
            "Nguồn cung khan hiếm tại các quận trung tâm đẩy giá vùng ven tăng theo.",
            "Giao dịch tập trung chủ yếu ở phân khúc 3-5 tỷ đồng.",
        ],
    },
    SeedArticle {
        id: "seed-2",
        title: "Ứng dụng AI giúp môi giới BĐS chốt khách nhanh gấp 3 lần",
        source: "Cafef",
        time_ago: "4 giờ trước",
        category: Category::ProptechAi,
        summary: [
            "Công cụ AI tự động lọc khách hàng tiềm năng từ dữ liệu lớn.",
            "Chatbot AI hỗ trợ tư vấn sơ bộ 24/7, giảm tải cho nhân sự.",
            "Tự động tạo video listing nhà ảo giúp khách xem nhà từ xa.",
        ],
    },
    SeedArticle {
        id: "seed-3",
        title: "Cảnh báo sạt lở tại các khu nghỉ dưỡng đồi núi phía Bắc",
        source: "Báo Tài Nguyên & Môi Trường",
        time_ago: "1 giờ trước",
        category: Category::DisasterRisk,
        summary: [
            "Mùa mưa đến sớm, nguy cơ sạt lở cao tại Sapa, Hà Giang.",
            "Nhiều homestay xây dựng trái phép trên nền đất yếu.",
            "Chính quyền địa phương bắt đầu rà soát và yêu cầu dừng hoạt động các cơ sở không an toàn.",
        ],
    },
    SeedArticle {
        id: "seed-4",
        title: "Báo cáo thị trường BĐS công nghiệp Q2: Tỷ lệ lấp đầy đạt 85%",
        source: "Savills Vietnam",
        time_ago: "30 phút trước",
        category: Category::DataReport,
        summary: [
            "Giá thuê đất KCN miền Bắc tăng 10% so với cùng kỳ.",
            "Dòng vốn FDI tiếp tục chảy mạnh vào Bắc Ninh, Hải Phòng.",
            "Nhu cầu nhà xưởng xây sẵn (RBF) tăng đột biến.",
        ],
    },
    SeedArticle {
        id: "seed-5",
        title: "Dự thảo nghị định mới về condotel: Gỡ vướng pháp lý sổ hồng",
        source: "Tuổi Trẻ",
        time_ago: "5 giờ trước",
        category: Category::PolicyLegal,
        summary: [
            "Quy định rõ ràng hơn về cấp giấy chứng nhận quyền sở hữu cho condotel.",
            "Xác định thời hạn sở hữu theo thời hạn dự án (thường là 50 năm).",
            "Kỳ vọng khơi thông dòng vốn đang 'đóng băng' tại phân khúc nghỉ dưỡng.",
        ],
    },
];

const SEED_HIGHLIGHTS: [&str; 3] = [
    "Thị trường căn hộ TP.HCM ghi nhận nguồn cung giảm 50% trong Q1/2024, đẩy giá sơ cấp tăng nhẹ.",
    "Luật Đất đai sửa đổi chính thức có hiệu lực, tác động mạnh đến quy trình đền bù giải tỏa.",
    "Xu hướng ứng dụng AI trong định giá nhà đất đang được các PropTech Việt Nam đẩy mạnh triển khai.",
];

pub fn seed_news() -> Vec<NewsItem> {
    SEED_ARTICLES
        .iter()
        .map(|a| NewsItem {
            id: a.id.to_string(),
            title: a.title.to_string(),
            source: a.source.to_string(),
            time_ago: a.time_ago.to_string(),
            category: a.category,
            summary_points: a.summary.iter().map(|s| s.to_string()).collect(),
            url: Some(search_fallback_url(a.title)),
            analysis: None,
        })
        .collect()
}

pub fn seed_briefing() -> Briefing {
    Briefing {
        date: vietnamese_long_date(today()),
        highlights: SEED_HIGHLIGHTS.iter().map(|s| s.to_string()).collect(),
    }
}
